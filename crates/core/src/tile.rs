//! Tile addressing
//!
//! Tile coordinates, packed tile keys and the quad-tree relations used by the
//! index (parent, children, ancestry). Geographic bounds of a tile depend on the
//! projection, see [`Projection::tile_bounds`](crate::Projection::tile_bounds).

use crate::projection::Projection;

/// Tile coordinates: x, y, and zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Create a new tile coordinate
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Packed key identifying this tile in the index.
    ///
    /// Layout: `y << 34 | x << 5 | z`. The zoom fits in 5 bits and x in 29 bits,
    /// which leaves room for custom schedules where x exceeds `2^z`.
    pub fn key(&self) -> u64 {
        ((self.y as u64) << 34) | ((self.x as u64) << 5) | self.z as u64
    }

    /// Inverse of [`TileCoord::key`].
    pub fn from_key(key: u64) -> Self {
        Self {
            z: (key & 0x1f) as u8,
            x: ((key >> 5) & 0x1fff_ffff) as u32,
            y: (key >> 34) as u32,
        }
    }

    /// Parent tile in the quad-tree, `None` at zoom 0.
    pub fn parent(&self) -> Option<Self> {
        if self.z == 0 {
            return None;
        }
        Some(Self::new(self.x >> 1, self.y >> 1, self.z - 1))
    }

    /// The four children in clipping order: left/top, left/bottom, right/top, right/bottom.
    pub fn children(&self) -> [Self; 4] {
        let (x, y, z) = (self.x * 2, self.y * 2, self.z + 1);
        [
            Self::new(x, y, z),
            Self::new(x, y + 1, z),
            Self::new(x + 1, y, z),
            Self::new(x + 1, y + 1, z),
        ]
    }

    /// Whether `other` lies inside this tile's quad-tree subtree (or is this tile).
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        if other.z < self.z {
            return false;
        }
        let shift = (other.z - self.z) as u32;
        other.x >> shift == self.x && other.y >> shift == self.y
    }
}

/// Bounding box in map units of a projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub lng_min: f64,
    pub lat_min: f64,
    pub lng_max: f64,
    pub lat_max: f64,
}

impl TileBounds {
    pub fn new(lng_min: f64, lat_min: f64, lng_max: f64, lat_max: f64) -> Self {
        Self {
            lng_min,
            lat_min,
            lng_max,
            lat_max,
        }
    }

    /// Whether a point lies inside (inclusive)
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.lng_min..=self.lng_max).contains(&lng) && (self.lat_min..=self.lat_max).contains(&lat)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.lng_min + self.lng_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }
}

/// Convert a map coordinate to the tile containing it at a given zoom level
///
/// # Arguments
///
/// * `lng` - Longitude (or easting) in the projection's units
/// * `lat` - Latitude (or northing) in the projection's units
/// * `zoom` - Zoom level
/// * `projection` - Projection defining the tile grid
///
/// # Returns
///
/// TileCoord with x, y, and zoom, clamped to the grid
pub fn lng_lat_to_tile(lng: f64, lat: f64, zoom: u8, projection: &Projection) -> TileCoord {
    let transform = projection.transform();
    let world_size = projection.world_size(zoom);
    let scale = projection.zoom_scale(zoom as f64);

    let to_index = |v: f64| -> u32 {
        let i = (v * scale).floor();
        i.clamp(0.0, (world_size - 1) as f64) as u32
    };

    TileCoord::new(
        to_index(transform.project_x(lng)),
        to_index(transform.project_y(lat)),
        zoom,
    )
}
