//! Coordinate projections for tiling.
//!
//! A [`Projection`] maps map coordinates (longitude/latitude in degrees, or
//! easting/northing in meters, feet, pixels...) into a normalized plane where
//! the whole world spans `[0, 1)` on its longest axis. Tiles are then cut from
//! that plane at `zoom_scale(z)` tiles per axis.
//!
//! Two transform families exist:
//!
//! - **Web Mercator** (`EPSG:mapbox`): the spherical Mercator formulas used by
//!   slippy maps. `zoom_scale(z) = 2^z`.
//! - **Linear**: every other projection maps its rectangular extent linearly,
//!   `x = (lng - minX) / maxExtent`, `y = (maxY - lat) / maxExtent`. Combined with
//!   a custom resolution table this gives non-power-of-two tile schedules.

use std::f64::consts::PI;
use std::fmt;
use std::sync::OnceLock;

use crate::tile::{TileBounds, TileCoord};
use crate::{Error, Result};

/// Radius of the WGS84 sphere in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Code of the mixed web-Mercator projection
pub const WEB_MERCATOR_CODE: &str = "EPSG:mapbox";

/// Default tile pixel size
pub const DEFAULT_TILE_SIZE: u32 = 512;

const CIRCUMFERENCE_AT_EQUATOR: f64 = 2.0 * PI * EARTH_RADIUS;

/// Linear unit of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Units {
    Degrees,
    Feet,
    Meters,
    Pixels,
    TilePixels,
    UsFeet,
}

impl Units {
    /// The unit's short name (`degrees`, `ft`, `m`, `pixels`, `tile-pixels`, `us-ft`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Degrees => "degrees",
            Units::Feet => "ft",
            Units::Meters => "m",
            Units::Pixels => "pixels",
            Units::TilePixels => "tile-pixels",
            Units::UsFeet => "us-ft",
        }
    }

    /// Parse a unit from its short name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "degrees" => Some(Units::Degrees),
            "ft" => Some(Units::Feet),
            "m" => Some(Units::Meters),
            "pixels" => Some(Units::Pixels),
            "tile-pixels" => Some(Units::TilePixels),
            "us-ft" => Some(Units::UsFeet),
            _ => None,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for constructing a [`Projection`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOptions {
    pub code: String,
    pub units: Units,
    /// `[minX, minY, maxX, maxY]` in map units
    pub extent: [f64; 4],
    /// Map units per tile pixel for each zoom; `None` marks an unsupported zoom
    pub resolutions: Option<Vec<Option<f64>>>,
    pub tile_size: Option<u32>,
    pub valid_lat_range: Option<[f64; 2]>,
}

impl ProjectionOptions {
    pub fn new(code: impl Into<String>, units: Units, extent: [f64; 4]) -> Self {
        Self {
            code: code.into(),
            units,
            extent,
            resolutions: None,
            tile_size: None,
            valid_lat_range: None,
        }
    }

    pub fn with_resolutions(mut self, resolutions: Vec<Option<f64>>) -> Self {
        self.resolutions = Some(resolutions);
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    pub fn with_valid_lat_range(mut self, range: [f64; 2]) -> Self {
        self.valid_lat_range = Some(range);
        self
    }
}

/// A projected coordinate system with an optional custom zoom schedule.
///
/// Immutable once built, apart from the lazily computed max extent.
#[derive(Debug)]
pub struct Projection {
    code: String,
    units: Units,
    extent: [f64; 4],
    resolutions: Option<Vec<Option<f64>>>,
    tile_size: u32,
    valid_lat_range: [f64; 2],
    origin_code: Option<String>,
    max_extent: OnceLock<f64>,
}

impl Clone for Projection {
    fn clone(&self) -> Self {
        Self {
            code: self.code.clone(),
            units: self.units,
            extent: self.extent,
            resolutions: self.resolutions.clone(),
            tile_size: self.tile_size,
            valid_lat_range: self.valid_lat_range,
            origin_code: self.origin_code.clone(),
            max_extent: OnceLock::new(),
        }
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.units == other.units
            && self.extent == other.extent
            && self.resolutions == other.resolutions
            && self.tile_size == other.tile_size
            && self.valid_lat_range == other.valid_lat_range
            && self.origin_code == other.origin_code
    }
}

impl Projection {
    /// Build a projection, validating its extent and resolution table.
    pub fn new(options: ProjectionOptions) -> Result<Self> {
        let [min_x, min_y, max_x, max_y] = options.extent;
        if !(max_x > min_x && max_y > min_y) {
            return Err(Error::InvalidProjection(format!(
                "{}: extent {:?} is empty",
                options.code, options.extent
            )));
        }
        if let Some(resolutions) = &options.resolutions {
            validate_resolutions(&options.code, resolutions)?;
        }
        let tile_size = options.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err(Error::InvalidProjection(format!(
                "{}: tile size must be positive",
                options.code
            )));
        }

        Ok(Self {
            valid_lat_range: options.valid_lat_range.unwrap_or([min_y, max_y]),
            code: options.code,
            units: options.units,
            extent: options.extent,
            resolutions: options.resolutions,
            tile_size,
            origin_code: None,
            max_extent: OnceLock::new(),
        })
    }

    /// The mixed web-Mercator projection used when no projection is configured.
    pub fn web_mercator() -> Self {
        Self {
            code: WEB_MERCATOR_CODE.to_string(),
            units: Units::Degrees,
            extent: [-180.0, -85.0, 180.0, 85.0],
            resolutions: None,
            tile_size: DEFAULT_TILE_SIZE,
            valid_lat_range: [-85.0, 85.0],
            origin_code: None,
            max_extent: OnceLock::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn extent(&self) -> [f64; 4] {
        self.extent
    }

    pub fn resolutions(&self) -> Option<&[Option<f64>]> {
        self.resolutions.as_deref()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn valid_lat_range(&self) -> [f64; 2] {
        self.valid_lat_range
    }

    pub fn origin_code(&self) -> Option<&str> {
        self.origin_code.as_deref()
    }

    /// Record the code of the projection this one was derived from.
    pub fn with_origin_code(mut self, origin_code: impl Into<String>) -> Self {
        self.origin_code = Some(origin_code.into());
        self
    }

    /// Replace the resolution table.
    pub fn set_resolutions(&mut self, resolutions: Vec<Option<f64>>) -> Result<()> {
        validate_resolutions(&self.code, &resolutions)?;
        self.resolutions = Some(resolutions);
        Ok(())
    }

    pub fn set_tile_size(&mut self, tile_size: u32) -> Result<()> {
        if tile_size == 0 {
            return Err(Error::InvalidProjection(format!(
                "{}: tile size must be positive",
                self.code
            )));
        }
        self.tile_size = tile_size;
        Ok(())
    }

    pub fn set_valid_lat_range(&mut self, range: [f64; 2]) {
        self.valid_lat_range = range;
    }

    /// Larger of the extent's width and height.
    pub fn max_extent(&self) -> f64 {
        *self.max_extent.get_or_init(|| {
            let [min_x, min_y, max_x, max_y] = self.extent;
            (max_x - min_x).max(max_y - min_y)
        })
    }

    /// Lowest zoom with a defined resolution, if a resolution table is set.
    pub fn min_zoom(&self) -> Option<usize> {
        self.resolutions
            .as_ref()
            .and_then(|r| r.iter().position(Option::is_some))
    }

    /// Highest zoom with a defined resolution, if a resolution table is set.
    ///
    /// A projection with a max zoom uses a custom (non-power-of-two) schedule.
    pub fn max_zoom(&self) -> Option<usize> {
        self.resolutions
            .as_ref()
            .and_then(|r| r.iter().rposition(Option::is_some))
    }

    /// Whether the tile schedule comes from a custom resolution table.
    pub fn has_custom_schedule(&self) -> bool {
        self.max_zoom().is_some()
    }

    /// Map units per tile pixel at a (possibly fractional) zoom.
    ///
    /// With a resolution table the value is interpolated linearly between the
    /// nearest defined entries below and above `zoom` (undefined entries are
    /// skipped), and clamped to the table's first and last defined entries.
    pub fn zoom_resolution(&self, zoom: f64) -> f64 {
        let default = || self.max_extent() / (self.tile_size as f64 * 2_f64.powf(zoom));
        let Some(resolutions) = &self.resolutions else {
            return default();
        };
        // Validated at construction: at least one entry is defined.
        let (Some(min_zoom), Some(max_zoom)) = (self.min_zoom(), self.max_zoom()) else {
            return default();
        };
        let defined = |z: usize| resolutions.get(z).copied().flatten().map(|r| (z, r));

        let lower = (min_zoom..=(zoom.floor().max(0.0) as usize).min(max_zoom))
            .rev()
            .find_map(defined);
        let upper = ((zoom.ceil().max(0.0) as usize).max(min_zoom)..=max_zoom).find_map(defined);

        match (lower, upper) {
            _ if zoom <= min_zoom as f64 => defined(min_zoom).map_or(1.0, |(_, r)| r),
            _ if zoom >= max_zoom as f64 => defined(max_zoom).map_or(1.0, |(_, r)| r),
            (Some((lz, lr)), Some((uz, ur))) if uz > lz => {
                lr + (zoom - lz as f64) / (uz - lz) as f64 * (ur - lr)
            }
            (Some((_, lr)), _) => lr,
            (None, Some((_, ur))) => ur,
            (None, None) => default(),
        }
    }

    /// Number of tiles spanning one axis at a (possibly fractional) zoom.
    ///
    /// Reduces to `2^zoom` when no resolution table is set.
    pub fn zoom_scale(&self, zoom: f64) -> f64 {
        if self.resolutions.is_some() {
            return self.max_extent() / self.zoom_resolution(zoom) / self.tile_size as f64;
        }
        2_f64.powf(zoom)
    }

    /// Zoom level at which the world is `scale` tiles across.
    pub fn scale_zoom(&self, scale: f64) -> f64 {
        scale.log2()
    }

    /// Number of whole tile columns at an integer zoom.
    pub fn world_size(&self, zoom: u8) -> u32 {
        self.zoom_scale(zoom as f64).ceil().max(1.0) as u32
    }

    /// Coordinate transform for this projection.
    pub fn transform(&self) -> CoordTransform {
        if self.code == WEB_MERCATOR_CODE || self.origin_code.as_deref() == Some(WEB_MERCATOR_CODE)
        {
            return CoordTransform::WebMercator;
        }
        let [min_x, min_y, max_x, max_y] = self.extent;
        CoordTransform::Linear {
            min_x,
            min_y,
            max_x,
            max_y,
            max_extent: self.max_extent(),
            units: self.units,
        }
    }

    /// Bounding box of a tile in map units.
    pub fn tile_bounds(&self, coord: &TileCoord) -> TileBounds {
        let world_size = self.zoom_scale(coord.z as f64);
        let transform = self.transform();

        TileBounds::new(
            transform.lng_from_mercator_x(coord.x as f64 / world_size),
            transform.lat_from_mercator_y((coord.y as f64 + 1.0) / world_size),
            transform.lng_from_mercator_x((coord.x as f64 + 1.0) / world_size),
            transform.lat_from_mercator_y(coord.y as f64 / world_size),
        )
    }

    /// Tile bounding box formatted as `minX,minY,maxX,maxY` (WMS `{bbox}` style).
    pub fn tile_bbox_string(&self, coord: &TileCoord) -> String {
        let b = self.tile_bounds(coord);
        format!("{},{},{},{}", b.lng_min, b.lat_min, b.lng_max, b.lat_max)
    }
}

fn validate_resolutions(code: &str, resolutions: &[Option<f64>]) -> Result<()> {
    let mut previous: Option<f64> = None;
    for (zoom, resolution) in resolutions.iter().enumerate() {
        let Some(resolution) = *resolution else {
            continue;
        };
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::InvalidProjection(format!(
                "{code}: resolution at zoom {zoom} must be a positive number, got {resolution}"
            )));
        }
        if let Some(previous) = previous {
            if resolution > previous {
                return Err(Error::InvalidProjection(format!(
                    "{code}: resolutions must not increase with zoom (zoom {zoom}: {resolution} > {previous})"
                )));
            }
        }
        previous = Some(resolution);
    }
    if previous.is_none() {
        return Err(Error::InvalidProjection(format!(
            "{code}: resolution table has no defined entries, cannot resolve min/max zoom"
        )));
    }
    Ok(())
}

/// Conversions between map coordinates and the normalized tiling plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordTransform {
    /// Spherical web Mercator on a [-180, 180] world.
    WebMercator,
    /// Linear mapping of a rectangular extent.
    Linear {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        max_extent: f64,
        units: Units,
    },
}

impl CoordTransform {
    pub fn circumference_at_latitude(&self, latitude: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator
            | CoordTransform::Linear {
                units: Units::Degrees,
                ..
            } => CIRCUMFERENCE_AT_EQUATOR * latitude.to_radians().cos(),
            CoordTransform::Linear { max_extent, .. } => max_extent,
        }
    }

    pub fn mercator_x_from_lng(&self, lng: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator => (180.0 + lng) / 360.0,
            CoordTransform::Linear {
                min_x, max_extent, ..
            } => (lng - min_x) / max_extent,
        }
    }

    pub fn mercator_y_from_lat(&self, lat: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator => {
                (180.0 - (180.0 / PI) * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) / 360.0
            }
            CoordTransform::Linear {
                max_y, max_extent, ..
            } => (max_y - lat) / max_extent,
        }
    }

    pub fn mercator_z_from_altitude(&self, altitude: f64, lat: f64) -> f64 {
        altitude / self.circumference_at_latitude(lat)
    }

    pub fn lng_from_mercator_x(&self, x: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator => x * 360.0 - 180.0,
            CoordTransform::Linear {
                min_x, max_extent, ..
            } => x * max_extent + min_x,
        }
    }

    pub fn lat_from_mercator_y(&self, y: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator => {
                let y2 = 180.0 - y * 360.0;
                (360.0 / PI) * (y2 * PI / 180.0).exp().atan() - 90.0
            }
            CoordTransform::Linear {
                max_y, max_extent, ..
            } => max_y - y * max_extent,
        }
    }

    pub fn altitude_from_mercator_z(&self, z: f64, y: f64) -> f64 {
        z * self.circumference_at_latitude(self.lat_from_mercator_y(y))
    }

    pub fn mercator_scale(&self, lat: f64) -> f64 {
        match *self {
            CoordTransform::WebMercator
            | CoordTransform::Linear {
                units: Units::Degrees,
                ..
            } => 1.0 / lat.to_radians().cos(),
            CoordTransform::Linear { .. } => 1.0 / lat,
        }
    }

    /// Project a longitude for tiling.
    pub fn project_x(&self, lng: f64) -> f64 {
        self.mercator_x_from_lng(lng)
    }

    /// Project a latitude for tiling.
    ///
    /// Web Mercator diverges at the poles, so its output is clamped to `[0, 1]`.
    pub fn project_y(&self, lat: f64) -> f64 {
        let y = self.mercator_y_from_lat(lat);
        match self {
            CoordTransform::WebMercator => y.clamp(0.0, 1.0),
            CoordTransform::Linear { .. } => y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_projection() -> Projection {
        // 1000 map units wide; zoom 1 = 1 tile, zoom 2 = 2.5 tiles, zoom 3 = 5 tiles
        Projection::new(
            ProjectionOptions::new("LOCAL:grid", Units::Meters, [0.0, 0.0, 1000.0, 1000.0])
                .with_tile_size(100)
                .with_resolutions(vec![None, Some(10.0), Some(4.0), Some(2.0)]),
        )
        .unwrap()
    }

    #[test]
    fn test_zoom_scale_power_of_two_without_resolutions() {
        let proj = Projection::web_mercator();
        for z in 0..=24 {
            assert_eq!(proj.zoom_scale(z as f64), 2_f64.powi(z));
        }
        assert!((proj.zoom_scale(1.5) - 2_f64.powf(1.5)).abs() < 1e-12);
        assert!(!proj.has_custom_schedule());
    }

    #[test]
    fn test_zoom_scale_custom_resolutions() {
        let proj = custom_projection();
        assert_eq!(proj.min_zoom(), Some(1));
        assert_eq!(proj.max_zoom(), Some(3));
        assert!(proj.has_custom_schedule());

        assert!((proj.zoom_scale(1.0) - 1.0).abs() < 1e-12);
        assert!((proj.zoom_scale(2.0) - 2.5).abs() < 1e-12);
        assert!((proj.zoom_scale(3.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_resolution_interpolates_and_clamps() {
        let proj = custom_projection();
        // halfway between 10 and 4
        assert!((proj.zoom_resolution(1.5) - 7.0).abs() < 1e-12);
        // zoom 0 is undefined: clamp to the first defined entry
        assert_eq!(proj.zoom_resolution(0.0), 10.0);
        assert_eq!(proj.zoom_resolution(-1.0), 10.0);
        // beyond the table: clamp to the last defined entry
        assert_eq!(proj.zoom_resolution(7.0), 2.0);
        assert_eq!(proj.zoom_resolution(3.5), 2.0);
    }

    #[test]
    fn test_zoom_scale_never_decreases_past_the_table() {
        let proj = custom_projection();
        let mut previous = 0.0;
        for step in 0..=40 {
            let scale = proj.zoom_scale(step as f64 * 0.25);
            assert!(scale >= previous, "zoom_scale({}) = {} < {}", step as f64 * 0.25, scale, previous);
            previous = scale;
        }
        assert!((proj.zoom_scale(4.0) - 5.0).abs() < 1e-12);
        assert!((proj.zoom_scale(24.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_resolution_skips_undefined_entries() {
        let proj = Projection::new(
            ProjectionOptions::new("LOCAL:gaps", Units::Meters, [0.0, 0.0, 800.0, 800.0])
                .with_tile_size(100)
                .with_resolutions(vec![Some(8.0), None, Some(2.0), None]),
        )
        .unwrap();
        assert_eq!(proj.max_zoom(), Some(2));
        // zoom 1 sits halfway between the defined zooms 0 and 2
        assert!((proj.zoom_resolution(1.0) - 5.0).abs() < 1e-12);
        assert!((proj.zoom_resolution(0.5) - 6.5).abs() < 1e-12);
        assert_eq!(proj.zoom_resolution(3.0), 2.0);
    }

    #[test]
    fn test_resolutions_must_not_increase() {
        let result = Projection::new(
            ProjectionOptions::new("BAD", Units::Meters, [0.0, 0.0, 10.0, 10.0])
                .with_resolutions(vec![Some(1.0), Some(2.0)]),
        );
        assert!(matches!(result, Err(Error::InvalidProjection(_))));
    }

    #[test]
    fn test_empty_resolution_table_is_rejected() {
        let result = Projection::new(
            ProjectionOptions::new("BAD", Units::Meters, [0.0, 0.0, 10.0, 10.0])
                .with_resolutions(vec![None, None]),
        );
        match result {
            Err(Error::InvalidProjection(msg)) => assert!(msg.contains("min/max zoom")),
            other => panic!("Expected InvalidProjection, got {:?}", other),
        }
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let t = Projection::web_mercator().transform();
        assert_eq!(t, CoordTransform::WebMercator);
        for lng in [-180.0, -90.0, 0.0, 45.5, 179.9] {
            let x = t.project_x(lng);
            assert!((t.lng_from_mercator_x(x) - lng).abs() < 1e-9);
        }
        for lat in [-85.0, -45.0, 0.0, 12.34, 85.0] {
            let y = t.project_y(lat);
            assert!((0.0..=1.0).contains(&y));
            assert!(
                (t.lat_from_mercator_y(y) - lat).abs() < 1e-9,
                "lat {} did not round-trip",
                lat
            );
        }
        assert_eq!(t.project_x(0.0), 0.5);
        assert!((t.project_y(0.0) - 0.5).abs() < 1e-12);
        // Poles are clamped
        assert_eq!(t.project_y(90.0), 0.0);
        assert_eq!(t.project_y(-90.0), 1.0);
    }

    #[test]
    fn test_linear_transform_monotonic_round_trip() {
        let proj = Projection::new(ProjectionOptions::new(
            "EPSG:4326",
            Units::Degrees,
            [-180.0, -90.0, 180.0, 90.0],
        ))
        .unwrap();
        assert_eq!(proj.max_extent(), 360.0);
        let t = proj.transform();

        assert_eq!(t.project_x(-180.0), 0.0);
        assert_eq!(t.project_y(90.0), 0.0);
        assert_eq!(t.project_y(-90.0), 0.5);
        assert!(t.project_y(10.0) < t.project_y(-10.0));

        for v in [-170.0, -3.5, 0.0, 77.7] {
            assert!((t.lng_from_mercator_x(t.project_x(v)) - v).abs() < 1e-9);
            assert!((t.lat_from_mercator_y(t.project_y(v / 2.0)) - v / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_origin_code_selects_web_mercator() {
        let proj = Projection::new(ProjectionOptions::new(
            "custom",
            Units::Degrees,
            [-180.0, -85.0, 180.0, 85.0],
        ))
        .unwrap()
        .with_origin_code(WEB_MERCATOR_CODE);
        assert_eq!(proj.transform(), CoordTransform::WebMercator);
    }

    #[test]
    fn test_tile_bounds_web_mercator() {
        let proj = Projection::web_mercator();
        let bounds = proj.tile_bounds(&TileCoord::new(0, 0, 0));
        assert!((bounds.lng_min + 180.0).abs() < 1e-9);
        assert!((bounds.lng_max - 180.0).abs() < 1e-9);
        assert!(bounds.lat_max > 85.0);
        assert!(bounds.lat_min < -85.0);

        let s = proj.tile_bbox_string(&TileCoord::new(1, 0, 1));
        assert!(s.starts_with("0,"), "unexpected bbox string {}", s);
    }

    #[test]
    fn test_tile_bounds_custom_schedule() {
        let proj = custom_projection();
        // zoom 2 has 2.5 tiles across 1000 units: 400 units per tile
        let bounds = proj.tile_bounds(&TileCoord::new(1, 0, 2));
        assert!((bounds.lng_min - 400.0).abs() < 1e-9);
        assert!((bounds.lng_max - 800.0).abs() < 1e-9);
        assert!((bounds.lat_max - 1000.0).abs() < 1e-9);
        assert!((bounds.lat_min - 600.0).abs() < 1e-9);
        assert_eq!(proj.world_size(2), 3);
    }

    #[test]
    fn test_clone_is_deep_and_equal() {
        let proj = custom_projection();
        let _ = proj.max_extent();
        let mut copy = proj.clone();
        assert_eq!(copy, proj);
        copy.set_tile_size(256).unwrap();
        assert_ne!(copy.tile_size(), proj.tile_size());
    }

    #[test]
    fn test_units_parse_round_trip() {
        for units in [
            Units::Degrees,
            Units::Feet,
            Units::Meters,
            Units::Pixels,
            Units::TilePixels,
            Units::UsFeet,
        ] {
            assert_eq!(Units::parse(units.as_str()), Some(units));
        }
        assert_eq!(Units::parse("furlongs"), None);
    }
}
