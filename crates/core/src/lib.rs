//! Core library for slicing GeoJSON into vector tiles on demand.
//!
//! The engine projects GeoJSON geometry into a normalized plane, simplifies it
//! once at the deepest zoom, and then cuts it into a quad-tree of tiles. Shallow
//! tiles are built eagerly when the index is created; deeper tiles are drilled
//! down lazily from the nearest ancestor that still holds its source geometry.
//!
//! Both standard power-of-two tiling schemes and custom projections with
//! arbitrary resolution tables are supported.
//!
//! # Examples
//!
//! ```
//! use geotiler_core::{Projection, TileIndex, TilerConfig};
//!
//! let geojson: geojson::GeoJson = r#"{
//!     "type": "Feature",
//!     "properties": {"name": "square"},
//!     "geometry": {
//!         "type": "Polygon",
//!         "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]]
//!     }
//! }"#
//! .parse()
//! .unwrap();
//!
//! let mut index = TileIndex::new(&geojson, TilerConfig::default(), Projection::web_mercator()).unwrap();
//! let tile = index.get_tile(0, 0, 0).unwrap();
//! assert_eq!(tile.features().len(), 1);
//! ```

use thiserror::Error;

pub mod builder;
pub mod clip;
pub mod convert;
pub mod feature;
pub mod geojson_out;
pub mod index;
pub mod projection;
pub mod registry;
pub mod simplify;
pub mod tile;
pub mod transform;
pub mod wrap;

pub use builder::{FeatureKind, LineMetrics, Tile, TileFeature};
pub use index::{TileIndex, TilingStrategy};
pub use projection::{CoordTransform, Projection, ProjectionOptions, Units};
pub use registry::ProjectionRegistry;
pub use tile::{TileBounds, TileCoord};

/// Highest zoom level the index accepts.
pub const MAX_SUPPORTED_ZOOM: u8 = 24;

/// Errors that can occur while building or querying a tile index
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    #[error("Unsupported geometry type '{geometry_type}': input data is not a valid GeoJSON object")]
    UnsupportedGeometry { geometry_type: String },

    #[error("Failed to parse GeoJSON: {0}")]
    GeoJsonParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Self {
        match err {
            geojson::Error::GeometryUnknownType(geometry_type) => {
                Error::UnsupportedGeometry { geometry_type }
            }
            other => Error::GeoJsonParse(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Default tile extent (4096 as per MVT spec)
pub const DEFAULT_EXTENT: u32 = 4096;

/// Default tile buffer on each side, in extent units
pub const DEFAULT_BUFFER: u32 = 64;

/// Configuration for building a tile index
#[derive(Debug, Clone, PartialEq)]
pub struct TilerConfig {
    /// Max zoom to preserve detail on
    pub max_zoom: u8,
    /// Max zoom of the eagerly built part of the index
    pub index_max_zoom: u8,
    /// Max number of points per tile in the eagerly built part of the index
    pub index_max_points: usize,
    /// Simplification tolerance (higher means simpler)
    pub tolerance: f64,
    /// Tile extent
    pub extent: u32,
    /// Tile buffer on each side
    pub buffer: u32,
    /// Whether to calculate line metrics
    pub line_metrics: bool,
    /// Name of a feature property to be promoted to the feature id
    pub promote_id: Option<String>,
    /// Whether to generate sequential feature ids. Cannot be used with `promote_id`
    pub generate_id: bool,
    /// Logging level: 0 quiet, 1 statistics, 2 per-tile tracing
    pub debug: u8,
    /// Attach `_metadataId` and `_metadata` (the serialized source feature) to every feature
    pub retain_metadata: bool,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            max_zoom: 14,
            index_max_zoom: 5,
            index_max_points: 100_000,
            tolerance: 3.0,
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
            line_metrics: false,
            promote_id: None,
            generate_id: false,
            debug: 0,
            retain_metadata: false,
        }
    }
}

impl TilerConfig {
    /// Set the max zoom.
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Set the max zoom and point threshold of the eager first pass.
    pub fn with_index_limits(mut self, index_max_zoom: u8, index_max_points: usize) -> Self {
        self.index_max_zoom = index_max_zoom;
        self.index_max_points = index_max_points;
        self
    }

    /// Set the simplification tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the tile extent.
    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    /// Set the buffer in extent units.
    pub fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Enable or disable line metrics.
    pub fn with_line_metrics(mut self, line_metrics: bool) -> Self {
        self.line_metrics = line_metrics;
        self
    }

    /// Promote a property to the feature id.
    pub fn with_promote_id(mut self, property: impl Into<String>) -> Self {
        self.promote_id = Some(property.into());
        self
    }

    /// Generate sequential feature ids.
    pub fn with_generate_id(mut self, generate_id: bool) -> Self {
        self.generate_id = generate_id;
        self
    }

    /// Set the logging level (0, 1 or 2).
    pub fn with_debug(mut self, debug: u8) -> Self {
        self.debug = debug;
        self
    }

    /// Keep the serialized source feature in the properties of every feature.
    pub fn with_retain_metadata(mut self, retain_metadata: bool) -> Self {
        self.retain_metadata = retain_metadata;
        self
    }

    /// Check the configuration for fatal errors.
    pub fn validate(&self) -> Result<()> {
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(Error::InvalidConfig(format!(
                "maxZoom should be in the 0-{} range, got {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            )));
        }
        if self.promote_id.is_some() && self.generate_id {
            return Err(Error::InvalidConfig(
                "promoteId and generateId cannot be used together".to_string(),
            ));
        }
        if self.extent == 0 {
            return Err(Error::InvalidConfig("extent must be positive".to_string()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TilerConfig::default();
        assert_eq!(config.max_zoom, 14);
        assert_eq!(config.index_max_zoom, 5);
        assert_eq!(config.index_max_points, 100_000);
        assert_eq!(config.extent, 4096);
        assert_eq!(config.buffer, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zoom_out_of_range() {
        let config = TilerConfig::default().with_max_zoom(25);
        match config.validate() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("maxZoom")),
            other => panic!("Expected InvalidConfig error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_conflicting_id_options() {
        let config = TilerConfig::default()
            .with_promote_id("name")
            .with_generate_id(true);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_config_accepts_index_zoom_above_max_zoom() {
        // The index clamps the eager depth to max_zoom instead
        let config = TilerConfig::default().with_max_zoom(3);
        assert!(config.index_max_zoom > config.max_zoom);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_geometry_maps_to_unsupported() {
        let err = Error::from(geojson::Error::GeometryUnknownType("Circle".to_string()));
        assert!(
            matches!(err, Error::UnsupportedGeometry { ref geometry_type } if geometry_type == "Circle"),
            "unexpected error: {:?}",
            err
        );
    }
}
