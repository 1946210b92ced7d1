//! Tile index: eager first-pass slicing and lazy drill-down.
//!
//! # Tiling strategies
//!
//! - [`TilingStrategy::Quadtree`]: power-of-two schedules. Construction splits
//!   tiles down to `index_max_zoom` (or until a tile holds at most
//!   `index_max_points` points); the frontier tiles keep their source features.
//!   [`TileIndex::get_tile`] later drills down from the nearest such ancestor.
//! - [`TilingStrategy::CustomSchedule`]: projections with a custom resolution
//!   table, whose zoom levels are not power-of-two multiples of each other.
//!   Only the root tile is built eagerly and keeps its source; every requested
//!   tile is clipped from the root in one shot.
//!
//! # Memory
//!
//! A tile's source is dropped as soon as it is split, so only the frontier of
//! the quad-tree holds pre-clip geometry.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use geojson::GeoJson;

use crate::builder::{create_tile, Tile};
use crate::clip::{clip, Axis};
use crate::convert::{check_geometry_types, Converter};
use crate::feature::VtFeature;
use crate::projection::{Projection, Units};
use crate::tile::TileCoord;
use crate::transform::transform_tile;
use crate::wrap::wrap;
use crate::{Error, Result, TilerConfig, MAX_SUPPORTED_ZOOM};

/// How tiles below the root are produced, fixed at index construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingStrategy {
    /// Recursive quad-tree splitting for power-of-two schedules
    Quadtree,
    /// One-shot clipping from the root for custom resolution tables
    CustomSchedule,
}

/// In-memory vector tile index over a fixed GeoJSON dataset.
#[derive(Debug)]
pub struct TileIndex {
    config: TilerConfig,
    projection: Projection,
    strategy: TilingStrategy,
    tiles: HashMap<u64, Tile>,
    tile_coords: Vec<TileCoord>,
    stats: BTreeMap<u8, u32>,
    total: u32,
}

impl TileIndex {
    /// Build an index over `geojson`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for fatal configuration errors. Nothing
    /// is indexed in that case.
    pub fn new(geojson: &GeoJson, mut config: TilerConfig, projection: Projection) -> Result<Self> {
        config.validate()?;
        config.index_max_zoom = config.index_max_zoom.min(config.max_zoom);

        let strategy = if projection.has_custom_schedule() {
            TilingStrategy::CustomSchedule
        } else {
            TilingStrategy::Quadtree
        };

        let started = Instant::now();
        let converted = Converter::new(&config, &projection).convert(geojson)?;
        let num_input = converted.len();
        let mut features: Vec<Arc<VtFeature>> = converted.into_iter().map(Arc::new).collect();

        if projection.units() == Units::Degrees {
            let buffer = config.buffer as f64 / config.extent as f64;
            features = wrap(features, buffer, config.line_metrics);
            if config.debug > 1 {
                log::trace!("wrapped {} features into {}", num_input, features.len());
            }
        }

        if config.debug > 0 {
            log::debug!("preprocess data: {:?}", started.elapsed());
            log::debug!(
                "index: maxZoom: {}, maxPoints: {}, strategy: {:?}",
                config.index_max_zoom,
                config.index_max_points,
                strategy
            );
        }

        let mut index = Self {
            config,
            projection,
            strategy,
            tiles: HashMap::new(),
            tile_coords: Vec::new(),
            stats: BTreeMap::new(),
            total: 0,
        };

        let started = Instant::now();
        if !features.is_empty() {
            let root = TileCoord::new(0, 0, 0);
            match strategy {
                TilingStrategy::Quadtree => index.split_tile(features, root, None),
                TilingStrategy::CustomSchedule => index.create_root(features),
            }
        }

        if index.config.debug > 0 {
            if let Some(root) = index.tiles.get(&TileCoord::new(0, 0, 0).key()) {
                log::debug!(
                    "features: {}, points: {}",
                    root.num_features,
                    root.num_points
                );
            }
            log::debug!("generate tiles: {:?}", started.elapsed());
            log::debug!("tiles generated: {} {:?}", index.total, index.stats);
        }
        log::info!(
            "Indexed {} features into {} tiles ({})",
            num_input,
            index.tiles.len(),
            index.projection.code()
        );

        Ok(index)
    }

    /// Parse GeoJSON text and build an index over it.
    pub fn from_json_str(input: &str, config: TilerConfig, projection: Projection) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| Error::GeoJsonParse(e.to_string()))?;
        Self::from_json_value(value, config, projection)
    }

    /// Build an index from an untyped JSON value.
    ///
    /// Unknown geometry types are reported as [`Error::UnsupportedGeometry`].
    pub fn from_json_value(
        value: serde_json::Value,
        config: TilerConfig,
        projection: Projection,
    ) -> Result<Self> {
        config.validate()?;
        check_geometry_types(&value)?;
        let geojson = GeoJson::from_json_value(value)?;
        Self::new(&geojson, config, projection)
    }

    /// Get a tile, drilling down from a retained ancestor when needed.
    ///
    /// `x` wraps around the world (`9` and `1` address the same column when the
    /// world is 8 tiles wide). Returns `None` for zooms above
    /// [`MAX_SUPPORTED_ZOOM`], rows outside the world, and tiles without data.
    pub fn get_tile(&mut self, z: u8, x: i64, y: i64) -> Option<&Tile> {
        if z > MAX_SUPPORTED_ZOOM {
            return None;
        }
        let world_size = self.projection.world_size(z) as i64;
        if y < 0 || y >= world_size {
            return None;
        }
        let coord = TileCoord::new(x.rem_euclid(world_size) as u32, y as u32, z);
        let key = coord.key();

        if !self.tiles.contains_key(&key) {
            if self.config.debug > 1 {
                log::trace!("drilling down to z{}-{}-{}", coord.z, coord.x, coord.y);
            }
            match self.strategy {
                TilingStrategy::CustomSchedule => self.split_tile_custom(coord),
                TilingStrategy::Quadtree => self.drill_down(coord),
            }
        }

        let (extent, buffer) = (self.config.extent, self.config.buffer);
        let tile = self.tiles.get_mut(&key)?;
        if self.config.debug > 1 && !tile.is_transformed() {
            log::trace!(
                "quantizing tile z{}-{}-{} ({} features)",
                coord.z,
                coord.x,
                coord.y,
                tile.features().len()
            );
        }
        transform_tile(tile, extent, buffer, &self.projection);

        if tile.is_empty() {
            return None;
        }
        Some(&*tile)
    }

    /// Look up a materialized tile without drilling down or quantizing.
    pub fn tile(&self, coord: &TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord.key())
    }

    pub fn config(&self) -> &TilerConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn strategy(&self) -> TilingStrategy {
        self.strategy
    }

    /// Every materialized tile, in creation order.
    pub fn tile_coords(&self) -> &[TileCoord] {
        &self.tile_coords
    }

    /// Number of tiles created per zoom (collected when `debug > 0`).
    pub fn stats(&self) -> &BTreeMap<u8, u32> {
        &self.stats
    }

    /// Number of tiles created (collected when `debug > 0`).
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of materialized tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn drill_down(&mut self, coord: TileCoord) {
        let mut ancestor = coord.parent();
        while let Some(candidate) = ancestor {
            if self.tiles.contains_key(&candidate.key()) {
                break;
            }
            ancestor = candidate.parent();
        }

        let Some(parent) = ancestor else {
            return;
        };
        let Some(source) = self
            .tiles
            .get_mut(&parent.key())
            .and_then(|tile| tile.source.take())
        else {
            return;
        };

        if self.config.debug > 1 {
            log::trace!(
                "found parent tile z{}-{}-{}",
                parent.z,
                parent.x,
                parent.y
            );
        }
        let started = Instant::now();
        self.split_tile(source, parent, Some(coord));
        if self.config.debug > 1 {
            log::trace!("drilling down: {:?}", started.elapsed());
        }
    }

    /// Split `features` from `coord` downwards with an explicit stack.
    ///
    /// Without a `target` this is the first pass, bounded by `index_max_zoom`
    /// and `index_max_points`. With a target it only descends towards it.
    fn split_tile(
        &mut self,
        features: Vec<Arc<VtFeature>>,
        coord: TileCoord,
        target: Option<TileCoord>,
    ) {
        let extent = self.config.extent as f64;
        let k1 = 0.5 * self.config.buffer as f64 / extent;
        let k2 = 0.5 - k1;
        let k3 = 0.5 + k1;
        let k4 = 1.0 + k1;
        let line_metrics = self.config.line_metrics;

        let mut stack = vec![(features, coord)];

        while let Some((features, coord)) = stack.pop() {
            let tile = match self.tiles.entry(coord.key()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let started = Instant::now();
                    let tile = create_tile(&features, coord, &self.config, &self.projection);
                    self.tile_coords.push(coord);

                    if self.config.debug > 0 {
                        if self.config.debug > 1 {
                            log::trace!(
                                "tile z{}-{}-{} (features: {}, points: {}, simplified: {}) in {:?}",
                                coord.z,
                                coord.x,
                                coord.y,
                                tile.num_features,
                                tile.num_points,
                                tile.num_simplified,
                                started.elapsed()
                            );
                        }
                        *self.stats.entry(coord.z).or_insert(0) += 1;
                        self.total += 1;
                    }
                    entry.insert(tile)
                }
            };

            let stop = match target {
                None => {
                    coord.z == self.config.index_max_zoom
                        || tile.num_points <= self.config.index_max_points
                }
                Some(target) => {
                    coord.z == self.config.max_zoom
                        || coord.z == target.z
                        || !coord.is_ancestor_of(&target)
                }
            };
            if stop {
                tile.source = Some(features);
                continue;
            }

            tile.source = None;
            if features.is_empty() {
                continue;
            }

            let (min_x, max_x, min_y, max_y) = (tile.min_x, tile.max_x, tile.min_y, tile.max_y);
            let scale = self.projection.zoom_scale(coord.z as f64);
            let x = coord.x as f64;
            let y = coord.y as f64;

            let started = Instant::now();
            let left = clip(&features, scale, x - k1, x + k3, Axis::X, min_x, max_x, line_metrics);
            let right = clip(&features, scale, x + k2, x + k4, Axis::X, min_x, max_x, line_metrics);
            drop(features);

            let split_y = |stripe: Option<Vec<Arc<VtFeature>>>| match stripe {
                Some(stripe) => (
                    clip(&stripe, scale, y - k1, y + k3, Axis::Y, min_y, max_y, line_metrics),
                    clip(&stripe, scale, y + k2, y + k4, Axis::Y, min_y, max_y, line_metrics),
                ),
                None => (None, None),
            };
            let (tl, bl) = split_y(left);
            let (tr, br) = split_y(right);

            if self.config.debug > 1 {
                log::trace!("clipping: {:?}", started.elapsed());
            }

            let [c_tl, c_bl, c_tr, c_br] = coord.children();
            stack.push((tl.unwrap_or_default(), c_tl));
            stack.push((bl.unwrap_or_default(), c_bl));
            stack.push((tr.unwrap_or_default(), c_tr));
            stack.push((br.unwrap_or_default(), c_br));
        }
    }

    fn create_root(&mut self, features: Vec<Arc<VtFeature>>) {
        let coord = TileCoord::new(0, 0, 0);
        let mut tile = create_tile(&features, coord, &self.config, &self.projection);
        tile.source = Some(features);
        self.insert_tile(coord, tile);
    }

    /// Clip the root's source straight to `coord` (custom schedules).
    fn split_tile_custom(&mut self, coord: TileCoord) {
        let k1 = 0.5 * self.config.buffer as f64 / self.config.extent as f64;
        let k4 = 1.0 + k1;
        let line_metrics = self.config.line_metrics;
        let scale = self.projection.zoom_scale(coord.z as f64);
        let (x, y) = (coord.x as f64, coord.y as f64);

        let clipped = {
            let Some(root) = self.tiles.get(&TileCoord::new(0, 0, 0).key()) else {
                return;
            };
            let Some(source) = &root.source else {
                return;
            };
            clip(source, scale, x - k1, x + k4, Axis::X, root.min_x, root.max_x, line_metrics)
                .and_then(|stripe| {
                    clip(&stripe, scale, y - k1, y + k4, Axis::Y, root.min_y, root.max_y, line_metrics)
                })
        };

        if let Some(features) = clipped {
            let tile = create_tile(&features, coord, &self.config, &self.projection);
            self.insert_tile(coord, tile);
        }
    }

    fn insert_tile(&mut self, coord: TileCoord, tile: Tile) {
        if self.config.debug > 0 {
            if self.config.debug > 1 {
                log::trace!(
                    "tile z{}-{}-{} (features: {}, points: {}, simplified: {})",
                    coord.z,
                    coord.x,
                    coord.y,
                    tile.num_features,
                    tile.num_points,
                    tile.num_simplified
                );
            }
            *self.stats.entry(coord.z).or_insert(0) += 1;
            self.total += 1;
        }
        self.tile_coords.push(coord);
        self.tiles.insert(coord.key(), tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionOptions;
    use serde_json::json;

    fn wgs84() -> Projection {
        Projection::new(ProjectionOptions::new(
            "EPSG:4326",
            Units::Degrees,
            [-180.0, -90.0, 180.0, 90.0],
        ))
        .unwrap()
    }

    fn custom() -> Projection {
        Projection::new(
            ProjectionOptions::new("LOCAL:grid", Units::Meters, [0.0, 0.0, 1000.0, 1000.0])
                .with_tile_size(100)
                .with_resolutions(vec![Some(10.0), Some(4.0), Some(2.0)]),
        )
        .unwrap()
    }

    fn square(lng: f64, lat: f64, size: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {"name": "square"},
            "geometry": {"type": "Polygon", "coordinates": [[
                [lng, lat], [lng, lat + size], [lng + size, lat + size], [lng + size, lat], [lng, lat]
            ]]}
        })
    }

    fn index(value: serde_json::Value, config: TilerConfig, projection: Projection) -> TileIndex {
        TileIndex::from_json_value(value, config, projection).unwrap()
    }

    #[test]
    fn test_strategy_is_resolved_from_projection() {
        let quad = index(square(0.0, 0.0, 10.0), TilerConfig::default(), wgs84());
        assert_eq!(quad.strategy(), TilingStrategy::Quadtree);

        let custom = index(square(100.0, 100.0, 50.0), TilerConfig::default(), custom());
        assert_eq!(custom.strategy(), TilingStrategy::CustomSchedule);
        assert_eq!(custom.len(), 1, "only the root is built eagerly");
        assert!(custom.tile(&TileCoord::new(0, 0, 0)).unwrap().has_source());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let result = TileIndex::from_json_value(
            square(0.0, 0.0, 1.0),
            TilerConfig::default().with_max_zoom(30),
            wgs84(),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_first_pass_stops_at_point_threshold() {
        let idx = index(square(0.0, 0.0, 10.0), TilerConfig::default(), wgs84());
        assert_eq!(idx.len(), 1, "five points is below the default threshold");
        assert!(idx.tile(&TileCoord::new(0, 0, 0)).unwrap().has_source());
    }

    #[test]
    fn test_first_pass_splits_to_index_max_zoom() {
        let config = TilerConfig::default().with_index_limits(2, 0).with_debug(1);
        let idx = index(square(0.0, 0.0, 10.0), config, wgs84());

        let root = idx.tile(&TileCoord::new(0, 0, 0)).unwrap();
        assert!(!root.has_source(), "split tiles drop their source");
        assert_eq!(idx.stats().get(&0), Some(&1));
        assert_eq!(idx.stats().get(&1), Some(&4));
        // Empty children are not split further
        assert!(idx.stats().get(&2).copied().unwrap_or(0) <= 16);
        assert_eq!(idx.total() as usize, idx.len());
        assert_eq!(idx.tile_coords()[0], TileCoord::new(0, 0, 0));

        for coord in idx.tile_coords() {
            let tile = idx.tile(coord).unwrap();
            if coord.z == 2 {
                assert!(tile.has_source(), "frontier tile {:?} keeps its source", coord);
            }
        }
    }

    #[test]
    fn test_index_max_zoom_is_clamped_to_max_zoom() {
        // Default index_max_zoom (5) is deeper than max_zoom
        let config = TilerConfig::default().with_max_zoom(3).with_index_limits(5, 0);
        let mut idx = index(square(0.0, 0.0, 10.0), config, wgs84());

        assert_eq!(idx.config().index_max_zoom, 3);
        assert!(idx.tile_coords().iter().all(|c| c.z <= 3));
        assert!(idx.get_tile(3, 4, 1).is_some());
        assert!(idx.get_tile(4, 8, 2).is_none(), "no tiles past max_zoom");

        assert!(TileIndex::from_json_value(
            square(0.0, 0.0, 10.0),
            TilerConfig::default().with_max_zoom(3),
            wgs84()
        )
        .is_ok());
    }

    #[test]
    fn test_get_tile_quantizes_once_at_every_debug_level() {
        for debug in [0, 1, 2] {
            let config = TilerConfig::default().with_debug(debug);
            let mut idx = index(square(0.0, 0.0, 10.0), config, wgs84());
            let first = idx.get_tile(0, 0, 0).map(|t| t.features().to_vec());
            assert!(idx.tile(&TileCoord::new(0, 0, 0)).unwrap().is_transformed());
            let second = idx.get_tile(0, 0, 0).map(|t| t.features().to_vec());
            assert!(first.is_some());
            assert_eq!(first, second, "debug level {} changed the output", debug);
        }
    }

    #[test]
    fn test_drill_down_materializes_path_only() {
        let mut idx = index(
            square(0.0, 0.0, 10.0),
            TilerConfig::default().with_max_zoom(8),
            wgs84(),
        );
        // lng 0..10, lat 0..10 in a 360 degree world: zoom 5 column 16, row 7
        let tile = idx.get_tile(5, 16, 7).expect("tile with data");
        assert_eq!(tile.features().len(), 1);
        assert!(tile.is_transformed());

        for coord in idx.tile_coords() {
            assert!(
                coord.is_ancestor_of(&TileCoord::new(16, 7, 5))
                    || coord.parent().is_some_and(|p| p.is_ancestor_of(&TileCoord::new(16, 7, 5))),
                "{:?} is off the drill-down path",
                coord
            );
        }
        let target = idx.tile(&TileCoord::new(16, 7, 5)).unwrap();
        assert!(target.has_source(), "drill-down target keeps source for deeper requests");
    }

    #[test]
    fn test_get_tile_misses() {
        let mut idx = index(square(0.0, 0.0, 10.0), TilerConfig::default(), wgs84());
        assert!(idx.get_tile(25, 0, 0).is_none());
        assert!(idx.get_tile(2, 0, 7).is_none(), "row outside the world");
        assert!(idx.get_tile(2, 0, -1).is_none());
        assert!(idx.get_tile(4, 0, 0).is_none(), "no data in the north-west corner");
    }

    #[test]
    fn test_x_wraps_around_the_world() {
        let mut idx = index(square(0.0, 0.0, 10.0), TilerConfig::default(), wgs84());
        let a = idx.get_tile(3, 4, 1).map(|t| t.features().to_vec());
        let b = idx.get_tile(3, 12, 1).map(|t| t.features().to_vec());
        let c = idx.get_tile(3, -4, 1).map(|t| t.features().to_vec());
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_custom_schedule_clips_from_root() {
        let mut idx = index(square(100.0, 100.0, 50.0), TilerConfig::default(), custom());
        // zoom 2 is 5 tiles of 200 units; the square sits in column 0, row 4
        let tile = idx.get_tile(2, 0, 4).expect("tile with data");
        assert_eq!(tile.features().len(), 1);
        assert!(idx.get_tile(2, 3, 0).is_none());
        // Intermediate zooms are never materialized
        assert!(idx.tile(&TileCoord::new(0, 0, 1)).is_none());
        // x wraps with a world of 5 columns
        assert!(idx.get_tile(2, 5, 4).is_some());
    }

    #[test]
    fn test_custom_schedule_past_the_table_keeps_last_scale() {
        let mut idx = index(square(100.0, 100.0, 50.0), TilerConfig::default(), custom());
        assert_eq!(idx.projection().world_size(4), 5);

        let last = idx.get_tile(2, 0, 4).map(|t| t.features().to_vec());
        let beyond = idx.get_tile(4, 0, 4).map(|t| t.features().to_vec());
        assert!(last.is_some());
        assert_eq!(beyond, last, "zoom 4 is cut at the zoom 2 resolution");
        assert!(idx.get_tile(4, 3, 0).is_none());
    }

    #[test]
    fn test_unknown_geometry_is_fatal() {
        let result = TileIndex::from_json_str(
            r#"{"type": "Feature", "properties": {}, "geometry": {"type": "Circle", "coordinates": [0, 0]}}"#,
            TilerConfig::default(),
            wgs84(),
        );
        match result {
            Err(err) => assert!(err.to_string().contains("Circle"), "unexpected error {}", err),
            Ok(_) => panic!("Circle must be rejected"),
        }
    }

    #[test]
    fn test_empty_input() {
        let mut idx = index(
            json!({"type": "FeatureCollection", "features": []}),
            TilerConfig::default(),
            wgs84(),
        );
        assert!(idx.is_empty());
        assert!(idx.get_tile(0, 0, 0).is_none());
    }
}
