//! Intermediate projected feature representation.
//!
//! Geometry is stored as flat `f64` buffers of `(x, y, importance)` triples in
//! the normalized `[0, 1)` plane. Importance is the squared distance at which
//! the simplifier kept a vertex; endpoints and clip intersections carry `1.0`
//! and are never dropped.

use std::sync::Arc;

use geojson::feature::Id;
use geojson::JsonObject;

/// One line or ring with its line-metric annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    /// Flat `(x, y, importance)` triples
    pub coords: Vec<f64>,
    /// Length for lines, absolute area for polygon rings
    pub size: f64,
    /// Distance along the source line where this slice starts
    pub start: f64,
    /// Distance along the source line where this slice ends
    pub end: f64,
}

impl Slice {
    pub fn new(coords: Vec<f64>, size: f64) -> Self {
        Self {
            coords,
            size,
            start: 0.0,
            end: size,
        }
    }

    /// An empty slice inheriting the metrics of `source`.
    pub fn empty_like(source: &Slice) -> Self {
        Self {
            coords: Vec::new(),
            size: source.size,
            start: source.start,
            end: source.end,
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn push(&mut self, x: f64, y: f64, importance: f64) {
        self.coords.extend_from_slice(&[x, y, importance]);
    }

    /// Copy of this slice shifted along x.
    pub fn shifted(&self, offset: f64) -> Self {
        let mut coords = self.coords.clone();
        for x in coords.iter_mut().step_by(3) {
            *x += offset;
        }
        Self {
            coords,
            size: self.size,
            start: self.start,
            end: self.end,
        }
    }
}

/// Projected geometry of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum VtGeometry {
    Point(Vec<f64>),
    MultiPoint(Vec<f64>),
    LineString(Slice),
    MultiLineString(Vec<Slice>),
    Polygon(Vec<Slice>),
    MultiPolygon(Vec<Vec<Slice>>),
}

impl VtGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            VtGeometry::Point(_) => "Point",
            VtGeometry::MultiPoint(_) => "MultiPoint",
            VtGeometry::LineString(_) => "LineString",
            VtGeometry::MultiLineString(_) => "MultiLineString",
            VtGeometry::Polygon(_) => "Polygon",
            VtGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Total number of vertices.
    pub fn num_points(&self) -> usize {
        match self {
            VtGeometry::Point(c) | VtGeometry::MultiPoint(c) => c.len() / 3,
            VtGeometry::LineString(s) => s.len(),
            VtGeometry::MultiLineString(rings) | VtGeometry::Polygon(rings) => {
                rings.iter().map(Slice::len).sum()
            }
            VtGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter())
                .map(Slice::len)
                .sum(),
        }
    }

    /// Copy of this geometry shifted along x.
    pub fn shifted(&self, offset: f64) -> Self {
        let shift_points = |coords: &Vec<f64>| {
            let mut coords = coords.clone();
            for x in coords.iter_mut().step_by(3) {
                *x += offset;
            }
            coords
        };
        let shift_rings = |rings: &Vec<Slice>| -> Vec<Slice> {
            rings.iter().map(|s| s.shifted(offset)).collect()
        };

        match self {
            VtGeometry::Point(c) => VtGeometry::Point(shift_points(c)),
            VtGeometry::MultiPoint(c) => VtGeometry::MultiPoint(shift_points(c)),
            VtGeometry::LineString(s) => VtGeometry::LineString(s.shifted(offset)),
            VtGeometry::MultiLineString(rings) => VtGeometry::MultiLineString(shift_rings(rings)),
            VtGeometry::Polygon(rings) => VtGeometry::Polygon(shift_rings(rings)),
            VtGeometry::MultiPolygon(polygons) => {
                VtGeometry::MultiPolygon(polygons.iter().map(shift_rings).collect())
            }
        }
    }
}

/// A projected feature ready for clipping.
#[derive(Debug, Clone, PartialEq)]
pub struct VtFeature {
    pub id: Option<Id>,
    pub geometry: VtGeometry,
    pub properties: Option<Arc<JsonObject>>,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// Already folded into the centre world by [`wrap`](crate::wrap::wrap)
    pub wrapped: bool,
}

impl VtFeature {
    /// Build a feature and compute its bounding box.
    ///
    /// Polygons are bounded by their outer rings only.
    pub fn new(id: Option<Id>, geometry: VtGeometry, properties: Option<Arc<JsonObject>>) -> Self {
        let mut bbox = [
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ];
        match &geometry {
            VtGeometry::Point(c) | VtGeometry::MultiPoint(c) => extend_bbox(&mut bbox, c),
            VtGeometry::LineString(s) => extend_bbox(&mut bbox, &s.coords),
            VtGeometry::MultiLineString(rings) => {
                for ring in rings {
                    extend_bbox(&mut bbox, &ring.coords);
                }
            }
            VtGeometry::Polygon(rings) => {
                if let Some(outer) = rings.first() {
                    extend_bbox(&mut bbox, &outer.coords);
                }
            }
            VtGeometry::MultiPolygon(polygons) => {
                for outer in polygons.iter().filter_map(|rings| rings.first()) {
                    extend_bbox(&mut bbox, &outer.coords);
                }
            }
        }
        let [min_x, min_y, max_x, max_y] = bbox;

        Self {
            id,
            geometry,
            properties,
            min_x,
            min_y,
            max_x,
            max_y,
            wrapped: false,
        }
    }

    /// Minimum coordinate along `axis` (0 = x, 1 = y).
    pub fn min(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.min_x
        } else {
            self.min_y
        }
    }

    /// Maximum coordinate along `axis` (0 = x, 1 = y).
    pub fn max(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.max_x
        } else {
            self.max_y
        }
    }
}

fn extend_bbox(bbox: &mut [f64; 4], coords: &[f64]) {
    for point in coords.chunks_exact(3) {
        bbox[0] = bbox[0].min(point[0]);
        bbox[1] = bbox[1].min(point[1]);
        bbox[2] = bbox[2].max(point[0]);
        bbox[3] = bbox[3].max(point[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Slice {
        let coords = points.iter().flat_map(|&(x, y)| [x, y, 1.0]).collect();
        Slice::new(coords, 0.0)
    }

    #[test]
    fn test_bbox_point_and_line() {
        let f = VtFeature::new(None, VtGeometry::Point(vec![0.25, 0.75, 0.0]), None);
        assert_eq!((f.min_x, f.min_y, f.max_x, f.max_y), (0.25, 0.75, 0.25, 0.75));

        let f = VtFeature::new(
            None,
            VtGeometry::LineString(ring(&[(0.1, 0.2), (0.4, 0.1), (0.3, 0.9)])),
            None,
        );
        assert_eq!((f.min_x, f.min_y, f.max_x, f.max_y), (0.1, 0.1, 0.4, 0.9));
        assert_eq!(f.min(0), 0.1);
        assert_eq!(f.max(1), 0.9);
    }

    #[test]
    fn test_bbox_polygon_uses_outer_ring() {
        let outer = ring(&[(0.2, 0.2), (0.2, 0.4), (0.4, 0.4), (0.2, 0.2)]);
        // A hole outside the outer ring does not grow the bbox
        let hole = ring(&[(0.0, 0.0), (0.9, 0.9), (0.0, 0.9), (0.0, 0.0)]);
        let f = VtFeature::new(None, VtGeometry::Polygon(vec![outer, hole]), None);
        assert_eq!((f.min_x, f.max_x), (0.2, 0.4));
    }

    #[test]
    fn test_empty_geometry_has_inverted_bbox() {
        let f = VtFeature::new(None, VtGeometry::MultiPoint(Vec::new()), None);
        assert!(f.min_x > f.max_x, "empty geometry must never pass a clip window");
    }

    #[test]
    fn test_shifted_keeps_metrics() {
        let mut s = ring(&[(0.125, 0.25), (0.375, 0.5)]);
        s.size = 5.0;
        s.start = 1.0;
        s.end = 4.0;
        let shifted = s.shifted(1.0);
        assert_eq!(shifted.coords, vec![1.125, 0.25, 1.0, 1.375, 0.5, 1.0]);
        assert_eq!((shifted.size, shifted.start, shifted.end), (5.0, 1.0, 4.0));

        let g = VtGeometry::MultiPoint(vec![0.5, 0.5, 0.0, 0.75, 0.125, 0.0]).shifted(-1.0);
        assert_eq!(g, VtGeometry::MultiPoint(vec![-0.5, 0.5, 0.0, -0.25, 0.125, 0.0]));
        assert_eq!(g.num_points(), 2);
    }
}
