//! Stripe clipping of projected features.
//!
//! Clips a feature list to a window along a single axis. A tile split clips
//! twice: once along x into a left and right stripe, then each stripe along y
//! into top and bottom halves. Windows overlap by the tile buffer so features
//! crossing a tile edge are duplicated into both neighbours.
//!
//! # Boundary vertices
//!
//! Where a line or ring crosses the window edge, a vertex is interpolated
//! exactly on the edge. It gets importance `1.0` so no zoom simplifies it away.
//! Lines are split into separate slices at every exit; polygon rings stay one
//! ring per input ring and are re-closed after clipping.

use std::sync::Arc;

use crate::feature::{Slice, VtFeature, VtGeometry};

/// Clipping axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Offset of this axis within a coordinate triple.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// Clip features to the stripe `[k1, k2]` (in tile units at `scale`) along `axis`.
///
/// # Arguments
///
/// * `features` - Features to clip
/// * `scale` - Tiles per axis at the zoom being split
/// * `k1`, `k2` - Window bounds in tile units, buffer included
/// * `axis` - Axis to clip along
/// * `min_all`, `max_all` - Extent of all features along `axis`
/// * `line_metrics` - Track distance along lines and emit one feature per slice
///
/// # Returns
///
/// The clipped features, or `None` when nothing intersects the window.
#[allow(clippy::too_many_arguments)]
pub fn clip(
    features: &[Arc<VtFeature>],
    scale: f64,
    k1: f64,
    k2: f64,
    axis: Axis,
    min_all: f64,
    max_all: f64,
    line_metrics: bool,
) -> Option<Vec<Arc<VtFeature>>> {
    let k1 = k1 / scale;
    let k2 = k2 / scale;

    if min_all >= k1 && max_all < k2 {
        return Some(features.to_vec());
    }
    if max_all < k1 || min_all >= k2 {
        return None;
    }

    let mut clipped = Vec::new();

    for feature in features {
        let min = feature.min(axis.index());
        let max = feature.max(axis.index());

        if min >= k1 && max < k2 {
            clipped.push(Arc::clone(feature));
            continue;
        }
        if max < k1 || min >= k2 {
            continue;
        }

        let mut emit = |geometry: VtGeometry| {
            clipped.push(Arc::new(VtFeature::new(
                feature.id.clone(),
                geometry,
                feature.properties.clone(),
            )));
        };

        match &feature.geometry {
            VtGeometry::Point(coords) | VtGeometry::MultiPoint(coords) => {
                let points = clip_points(coords, k1, k2, axis);
                match points.len() {
                    0 => {}
                    3 => emit(VtGeometry::Point(points)),
                    _ => emit(VtGeometry::MultiPoint(points)),
                }
            }
            VtGeometry::LineString(line) => {
                let mut slices = Vec::new();
                clip_line(line, &mut slices, k1, k2, axis, false, line_metrics);
                if line_metrics {
                    for slice in slices {
                        emit(VtGeometry::LineString(slice));
                    }
                } else if let Some(geometry) = lines_geometry(slices) {
                    emit(geometry);
                }
            }
            VtGeometry::MultiLineString(lines) => {
                let slices = clip_lines(lines, k1, k2, axis, false);
                if let Some(geometry) = lines_geometry(slices) {
                    emit(geometry);
                }
            }
            VtGeometry::Polygon(rings) => {
                let rings = clip_lines(rings, k1, k2, axis, true);
                if !rings.is_empty() {
                    emit(VtGeometry::Polygon(rings));
                }
            }
            VtGeometry::MultiPolygon(polygons) => {
                let polygons: Vec<Vec<Slice>> = polygons
                    .iter()
                    .map(|rings| clip_lines(rings, k1, k2, axis, true))
                    .filter(|rings| !rings.is_empty())
                    .collect();
                if !polygons.is_empty() {
                    emit(VtGeometry::MultiPolygon(polygons));
                }
            }
        }
    }

    if clipped.is_empty() {
        None
    } else {
        Some(clipped)
    }
}

fn lines_geometry(mut slices: Vec<Slice>) -> Option<VtGeometry> {
    match slices.len() {
        0 => None,
        1 => slices.pop().map(VtGeometry::LineString),
        _ => Some(VtGeometry::MultiLineString(slices)),
    }
}

fn clip_points(coords: &[f64], k1: f64, k2: f64, axis: Axis) -> Vec<f64> {
    let mut out = Vec::new();
    for point in coords.chunks_exact(3) {
        let a = point[axis.index()];
        if (k1..=k2).contains(&a) {
            out.extend_from_slice(point);
        }
    }
    out
}

fn clip_lines(rings: &[Slice], k1: f64, k2: f64, axis: Axis, is_polygon: bool) -> Vec<Slice> {
    let mut out = Vec::new();
    for ring in rings {
        clip_line(ring, &mut out, k1, k2, axis, is_polygon, false);
    }
    out
}

fn clip_line(
    geom: &Slice,
    out: &mut Vec<Slice>,
    k1: f64,
    k2: f64,
    axis: Axis,
    is_polygon: bool,
    track_metrics: bool,
) {
    let coords = &geom.coords;
    if coords.len() < 3 {
        return;
    }

    let mut slice = Slice::empty_like(geom);
    let mut len = geom.start;
    let mut seg_len = 0.0;
    let mut t = 0.0;

    for i in (0..coords.len() - 3).step_by(3) {
        let (ax, ay, az) = (coords[i], coords[i + 1], coords[i + 2]);
        let (bx, by) = (coords[i + 3], coords[i + 4]);
        let a = coords[i + axis.index()];
        let b = coords[i + 3 + axis.index()];
        let mut exited = false;

        if track_metrics {
            seg_len = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
        }

        if a < k1 {
            // ---|-->  | enters from the low side
            if b > k1 {
                t = intersect(&mut slice, ax, ay, bx, by, k1, axis);
                if track_metrics {
                    slice.start = len + seg_len * t;
                }
            }
        } else if a > k2 {
            // |  <--|--- enters from the high side
            if b < k2 {
                t = intersect(&mut slice, ax, ay, bx, by, k2, axis);
                if track_metrics {
                    slice.start = len + seg_len * t;
                }
            }
        } else {
            slice.push(ax, ay, az);
        }

        if b < k1 && a >= k1 {
            // <--|---  | exits on the low side
            t = intersect(&mut slice, ax, ay, bx, by, k1, axis);
            exited = true;
        }
        if b > k2 && a <= k2 {
            // |  ---|--> exits on the high side
            t = intersect(&mut slice, ax, ay, bx, by, k2, axis);
            exited = true;
        }

        if !is_polygon && exited {
            if track_metrics {
                slice.end = len + seg_len * t;
            }
            out.push(std::mem::replace(&mut slice, Slice::empty_like(geom)));
        }

        if track_metrics {
            len += seg_len;
        }
    }

    let last = coords.len() - 3;
    let a = coords[last + axis.index()];
    if (k1..=k2).contains(&a) {
        slice.push(coords[last], coords[last + 1], coords[last + 2]);
    }

    // Re-close rings whose endpoints were cut off
    let n = slice.coords.len();
    if is_polygon && n >= 6 {
        let (x0, y0, z0) = (slice.coords[0], slice.coords[1], slice.coords[2]);
        if slice.coords[n - 3] != x0 || slice.coords[n - 2] != y0 {
            slice.push(x0, y0, z0);
        }
    }

    if !slice.is_empty() {
        out.push(slice);
    }
}

/// Push the point where segment `a`-`b` crosses `v` on `axis`; returns the segment parameter.
fn intersect(out: &mut Slice, ax: f64, ay: f64, bx: f64, by: f64, v: f64, axis: Axis) -> f64 {
    match axis {
        Axis::X => {
            let t = (v - ax) / (bx - ax);
            out.push(v, ay + (by - ay) * t, 1.0);
            t
        }
        Axis::Y => {
            let t = (v - ay) / (by - ay);
            out.push(ax + (bx - ax) * t, v, 1.0);
            t
        }
    }
}
