//! GeoJSON to projected feature conversion.
//!
//! Walks GeoJSON input (collections, features, bare geometries and geometry
//! collections), projects every coordinate through the index projection and
//! runs the simplifier once at the tolerance of the deepest zoom.

use std::sync::Arc;

use geojson::feature::Id;
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use uuid::Uuid;

use crate::feature::{Slice, VtFeature, VtGeometry};
use crate::projection::{CoordTransform, Projection};
use crate::simplify::simplify;
use crate::{Error, Result, TilerConfig};

const KNOWN_TYPES: &[&str] = &[
    "Feature",
    "FeatureCollection",
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Converts GeoJSON into [`VtFeature`]s for one projection and configuration.
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    config: &'a TilerConfig,
    transform: CoordTransform,
    sq_tolerance: f64,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a TilerConfig, projection: &Projection) -> Self {
        let tolerance = config.tolerance
            / (projection.zoom_scale(config.max_zoom as f64) * config.extent as f64);
        Self {
            config,
            transform: projection.transform(),
            sq_tolerance: tolerance * tolerance,
        }
    }

    /// Squared simplification tolerance in projected units.
    pub fn sq_tolerance(&self) -> f64 {
        self.sq_tolerance
    }

    /// Convert any GeoJSON object into a flat feature list.
    ///
    /// A bare geometry is treated as a feature without id or properties.
    pub fn convert(&self, geojson: &GeoJson) -> Result<Vec<VtFeature>> {
        let mut features = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for (index, feature) in collection.features.iter().enumerate() {
                    self.convert_feature(&mut features, feature, index)?;
                }
            }
            GeoJson::Feature(feature) => self.convert_feature(&mut features, feature, 0)?,
            GeoJson::Geometry(geometry) => {
                let feature = Feature {
                    bbox: None,
                    geometry: Some(geometry.clone()),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                self.convert_feature(&mut features, &feature, 0)?;
            }
        }
        Ok(features)
    }

    fn convert_feature(
        &self,
        out: &mut Vec<VtFeature>,
        feature: &Feature,
        index: usize,
    ) -> Result<()> {
        let Some(geometry) = &feature.geometry else {
            return Ok(());
        };
        let id = self.feature_id(feature, index);
        let properties = self.properties(feature)?;
        self.convert_geometry(out, &geometry.value, id, properties);
        Ok(())
    }

    /// Explicit id, then the promoted property, then the generated index.
    fn feature_id(&self, feature: &Feature, index: usize) -> Option<Id> {
        if let Some(id) = &feature.id {
            return Some(id.clone());
        }
        if let Some(key) = &self.config.promote_id {
            return match feature.properties.as_ref().and_then(|p| p.get(key)) {
                Some(JsonValue::String(s)) => Some(Id::String(s.clone())),
                Some(JsonValue::Number(n)) => Some(Id::Number(n.clone())),
                _ => None,
            };
        }
        if self.config.generate_id {
            return Some(Id::Number(index.into()));
        }
        None
    }

    fn properties(&self, feature: &Feature) -> Result<Option<Arc<JsonObject>>> {
        if !self.config.retain_metadata {
            return Ok(feature.properties.clone().map(Arc::new));
        }

        let metadata =
            serde_json::to_string(feature).map_err(|e| Error::GeoJsonParse(e.to_string()))?;
        let mut properties = feature.properties.clone().unwrap_or_default();
        properties.insert(
            "_metadataId".to_string(),
            JsonValue::String(next_metadata_id()),
        );
        properties.insert("_metadata".to_string(), JsonValue::String(metadata));
        Ok(Some(Arc::new(properties)))
    }

    fn convert_geometry(
        &self,
        out: &mut Vec<VtFeature>,
        value: &geojson::Value,
        id: Option<Id>,
        properties: Option<Arc<JsonObject>>,
    ) {
        let geometry = match value {
            geojson::Value::Point(position) => {
                let coords = self.convert_points(std::slice::from_ref(position));
                if coords.is_empty() {
                    return;
                }
                VtGeometry::Point(coords)
            }
            geojson::Value::MultiPoint(positions) => {
                let coords = self.convert_points(positions);
                if coords.is_empty() {
                    return;
                }
                VtGeometry::MultiPoint(coords)
            }
            geojson::Value::LineString(line) => {
                let slice = self.convert_line(line, false);
                if slice.is_empty() {
                    return;
                }
                VtGeometry::LineString(slice)
            }
            geojson::Value::MultiLineString(lines) => {
                if self.config.line_metrics {
                    // One feature per line so each keeps its own metrics
                    for line in lines {
                        let slice = self.convert_line(line, false);
                        if !slice.is_empty() {
                            out.push(VtFeature::new(
                                id.clone(),
                                VtGeometry::LineString(slice),
                                properties.clone(),
                            ));
                        }
                    }
                    return;
                }
                let rings = self.convert_lines(lines, false);
                if rings.is_empty() {
                    return;
                }
                VtGeometry::MultiLineString(rings)
            }
            geojson::Value::Polygon(rings) => {
                let rings = self.convert_lines(rings, true);
                if rings.is_empty() {
                    return;
                }
                VtGeometry::Polygon(rings)
            }
            geojson::Value::MultiPolygon(polygons) => {
                let polygons: Vec<Vec<Slice>> = polygons
                    .iter()
                    .map(|rings| self.convert_lines(rings, true))
                    .filter(|rings| !rings.is_empty())
                    .collect();
                if polygons.is_empty() {
                    return;
                }
                VtGeometry::MultiPolygon(polygons)
            }
            geojson::Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.convert_geometry(out, &geometry.value, id.clone(), properties.clone());
                }
                return;
            }
        };

        out.push(VtFeature::new(id, geometry, properties));
    }

    fn convert_points(&self, positions: &[Vec<f64>]) -> Vec<f64> {
        let mut coords = Vec::with_capacity(positions.len() * 3);
        for p in positions.iter().filter(|p| p.len() >= 2) {
            coords.extend_from_slice(&[
                self.transform.project_x(p[0]),
                self.transform.project_y(p[1]),
                0.0,
            ]);
        }
        coords
    }

    /// Project and simplify one line or ring.
    ///
    /// Size is the length for lines and the absolute shoelace area for rings.
    fn convert_line(&self, ring: &[Vec<f64>], is_polygon: bool) -> Slice {
        let mut coords = Vec::with_capacity(ring.len() * 3);
        let mut size = 0.0;
        let mut previous: Option<(f64, f64)> = None;

        for p in ring.iter().filter(|p| p.len() >= 2) {
            let x = self.transform.project_x(p[0]);
            let y = self.transform.project_y(p[1]);
            coords.extend_from_slice(&[x, y, 0.0]);

            if let Some((x0, y0)) = previous {
                if is_polygon {
                    size += (x0 * y - x * y0) / 2.0;
                } else {
                    size += ((x - x0).powi(2) + (y - y0).powi(2)).sqrt();
                }
            }
            previous = Some((x, y));
        }

        if coords.is_empty() {
            return Slice::default();
        }

        let n = coords.len() / 3;
        coords[2] = 1.0;
        simplify(&mut coords, 0, n, self.sq_tolerance);
        coords[(n - 1) * 3 + 2] = 1.0;

        Slice::new(coords, size.abs())
    }

    fn convert_lines(&self, rings: &[Vec<Vec<f64>>], is_polygon: bool) -> Vec<Slice> {
        rings
            .iter()
            .map(|ring| self.convert_line(ring, is_polygon))
            .filter(|slice| !slice.is_empty())
            .collect()
    }
}

/// Random 32-digit hexadecimal id.
fn next_metadata_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Reject any GeoJSON object whose `type` is not a known feature or geometry type.
///
/// Walks `features`, `geometry` and `geometries` members recursively.
pub fn check_geometry_types(value: &JsonValue) -> Result<()> {
    let JsonValue::Object(object) = value else {
        return Ok(());
    };

    if let Some(JsonValue::String(type_name)) = object.get("type") {
        if !KNOWN_TYPES.contains(&type_name.as_str()) {
            return Err(Error::UnsupportedGeometry {
                geometry_type: type_name.clone(),
            });
        }
    }

    if let Some(geometry) = object.get("geometry") {
        check_geometry_types(geometry)?;
    }
    for key in ["features", "geometries"] {
        if let Some(JsonValue::Array(items)) = object.get(key) {
            for item in items {
                check_geometry_types(item)?;
            }
        }
    }
    Ok(())
}
