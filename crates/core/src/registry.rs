//! Registry of known projections, keyed by code.
//!
//! The registry is an ordinary value owned by the caller. Lookups return clones
//! so a projection handed to an index can never change under it.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::projection::{Projection, ProjectionOptions, Units, EARTH_RADIUS, WEB_MERCATOR_CODE};

const WEB_MERCATOR_CODES: &[&str] = &[
    "EPSG:3857",
    "EPSG:102100",
    "EPSG:102113",
    "EPSG:900913",
    "urn:ogc:def:crs:EPSG:6.18:3:3857",
    "urn:ogc:def:crs:EPSG::3857",
    "http://www.opengis.net/gml/srs/epsg.xml#3857",
];

const GEOGRAPHIC_CODES: &[&str] = &[
    "CRS:84",
    "EPSG:4326",
    "urn:ogc:def:crs:EPSG::4326",
    "urn:ogc:def:crs:EPSG:6.6:4326",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:OGC:2:84",
    "http://www.opengis.net/gml/srs/epsg.xml#4326",
    "urn:x-ogc:def:crs:EPSG:4326",
];

/// Codes that name the same coordinate system.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["EPSG:3857", "3857"],
    &["EPSG:4326", "4326", "EPSG:4490", "4490"],
    &[WEB_MERCATOR_CODE, "web_Mercator", "mapbox"],
];

/// Explicit registry of projections.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRegistry {
    projections: HashMap<String, Projection>,
}

impl ProjectionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding web Mercator (`EPSG:mapbox`), the EPSG:3857 family and
    /// the EPSG:4326 family.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add(Projection::web_mercator());

        let half = PI * EARTH_RADIUS;
        for code in WEB_MERCATOR_CODES {
            registry.add_options(ProjectionOptions::new(
                *code,
                Units::Meters,
                [-half, -half, half, half],
            ));
        }
        for code in GEOGRAPHIC_CODES {
            registry.add_options(ProjectionOptions::new(
                *code,
                Units::Degrees,
                [-180.0, -90.0, 180.0, 90.0],
            ));
        }
        registry
    }

    fn add_options(&mut self, options: ProjectionOptions) {
        match Projection::new(options) {
            Ok(projection) => self.add(projection),
            Err(err) => log::warn!("Skipping built-in projection: {}", err),
        }
    }

    /// Register a projection under its code, replacing any previous entry.
    pub fn add(&mut self, projection: Projection) {
        self.projections
            .insert(projection.code().to_string(), projection);
    }

    /// Register several projections.
    pub fn add_all(&mut self, projections: impl IntoIterator<Item = Projection>) {
        for projection in projections {
            self.add(projection);
        }
    }

    /// Look up a projection by code, falling back to equivalent codes.
    ///
    /// The returned clone remembers the registered code it came from as its
    /// origin code.
    pub fn get(&self, code: &str) -> Option<Projection> {
        if let Some(projection) = self.projections.get(code) {
            return Some(projection.clone());
        }

        let group = ALIAS_GROUPS.iter().find(|group| group.contains(&code))?;
        group.iter().find_map(|alias| {
            self.projections
                .get(*alias)
                .map(|p| p.clone().with_origin_code(p.code()))
        })
    }

    /// Whether `code` (or an equivalent code) resolves to a projection.
    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Remove every projection.
    pub fn clear(&mut self) {
        self.projections.clear();
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    /// Registered codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.projections.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
