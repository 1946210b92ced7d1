//! Recovering geographic GeoJSON from quantized tile features.
//!
//! Quantization and projection are reversed for a given tile address, and
//! polygon rings are regrouped into polygons by their winding.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geojson::{Feature, FeatureCollection, JsonValue};

use crate::builder::{FeatureKind, Tile, TileFeature};
use crate::projection::Projection;
use crate::tile::TileCoord;

impl TileFeature {
    /// Geometry of this feature in the projection's map units.
    ///
    /// `x`, `y` and `z` address the tile the feature was quantized for. A
    /// single part yields a simple geometry, several parts a `Multi*` one.
    pub fn to_geometry(&self, x: u32, y: u32, z: u8, projection: &Projection) -> Geometry<f64> {
        let transform = projection.transform();
        let extent = self.extent as f64;
        let size = extent * projection.zoom_scale(z as f64);
        let x0 = extent * x as f64;
        let y0 = extent * y as f64;

        let project = |p: &Coord<i32>| Coord {
            x: transform.lng_from_mercator_x((p.x as f64 + x0) / size),
            y: transform.lat_from_mercator_y((p.y as f64 + y0) / size),
        };
        let line = |ring: &[Coord<i32>]| ring.iter().map(&project).collect::<LineString<f64>>();

        match self.kind {
            FeatureKind::Point => {
                let mut points: Vec<Point<f64>> = self
                    .geometry
                    .iter()
                    .filter_map(|ring| ring.first())
                    .map(|p| Point::from(project(p)))
                    .collect();
                if points.len() == 1 {
                    Geometry::Point(points.remove(0))
                } else {
                    Geometry::MultiPoint(MultiPoint::new(points))
                }
            }
            FeatureKind::LineString => {
                let mut lines: Vec<LineString<f64>> =
                    self.geometry.iter().map(|ring| line(ring)).collect();
                if lines.len() == 1 {
                    Geometry::LineString(lines.remove(0))
                } else {
                    Geometry::MultiLineString(MultiLineString::new(lines))
                }
            }
            FeatureKind::Polygon => {
                let mut polygons: Vec<Polygon<f64>> = classify_rings(&self.geometry)
                    .into_iter()
                    .map(|rings| {
                        let mut rings = rings.into_iter().map(&line);
                        let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
                        Polygon::new(exterior, rings.collect())
                    })
                    .collect();
                if polygons.len() == 1 {
                    Geometry::Polygon(polygons.remove(0))
                } else {
                    Geometry::MultiPolygon(MultiPolygon::new(polygons))
                }
            }
        }
    }

    /// This feature as a GeoJSON feature in the projection's map units.
    ///
    /// Line metrics, when present, are exposed as the `mapbox_clip_start` and
    /// `mapbox_clip_end` properties.
    pub fn to_geojson(&self, x: u32, y: u32, z: u8, projection: &Projection) -> Feature {
        let geometry = self.to_geometry(x, y, z, projection);

        let properties = match self.line_metrics {
            Some(metrics) => {
                let mut properties = self.properties.as_deref().cloned().unwrap_or_default();
                properties.insert(
                    "mapbox_clip_start".to_string(),
                    JsonValue::from(metrics.clip_start()),
                );
                properties.insert(
                    "mapbox_clip_end".to_string(),
                    JsonValue::from(metrics.clip_end()),
                );
                Some(properties)
            }
            None => self.properties.as_deref().cloned(),
        };

        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            id: self.id.clone(),
            properties,
            foreign_members: None,
        }
    }
}

impl Tile {
    /// Every feature of this tile as GeoJSON.
    ///
    /// Only meaningful once the tile has been quantized, i.e. for tiles
    /// returned by [`TileIndex::get_tile`](crate::TileIndex::get_tile).
    pub fn to_geojson(&self, projection: &Projection) -> FeatureCollection {
        let TileCoord { x, y, z } = self.coord;
        FeatureCollection {
            bbox: None,
            features: self
                .features()
                .iter()
                .map(|feature| feature.to_geojson(x, y, z, projection))
                .collect(),
            foreign_members: None,
        }
    }
}

/// Group rings into polygons: a ring winding like the first one starts a new
/// polygon, a ring winding the other way is a hole of the current polygon.
/// Rings with zero area are skipped.
pub fn classify_rings(rings: &[Vec<Coord<i32>>]) -> Vec<Vec<&[Coord<i32>]>> {
    if rings.len() <= 1 {
        return vec![rings.iter().map(Vec::as_slice).collect()];
    }

    let mut polygons = Vec::new();
    let mut polygon: Vec<&[Coord<i32>]> = Vec::new();
    let mut ccw = None;

    for ring in rings {
        let area = signed_area(ring);
        if area == 0.0 {
            continue;
        }
        let is_ccw = area < 0.0;
        let first_ccw = *ccw.get_or_insert(is_ccw);

        if is_ccw == first_ccw && !polygon.is_empty() {
            polygons.push(std::mem::take(&mut polygon));
        }
        polygon.push(ring.as_slice());
    }
    if !polygon.is_empty() {
        polygons.push(polygon);
    }

    polygons
}

/// Signed area (doubled) of a ring in tile space; outer rings built by the
/// tile builder are positive.
pub fn signed_area(ring: &[Coord<i32>]) -> f64 {
    let n = ring.len();
    if n == 0 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        let (p1, p2) = (ring[i], ring[j]);
        sum += (p2.x as f64 - p1.x as f64) * (p1.y as f64 + p2.y as f64);
        j = i;
    }
    sum
}
