//! CLI for geotiler - Slice GeoJSON into vector tiles on demand
//!
//! This is a thin wrapper around the geotiler-core library.

use anyhow::{Context, Result};
use clap::Parser;
use geotiler_core::tile::lng_lat_to_tile;
use geotiler_core::{Projection, ProjectionRegistry, TileCoord, TileIndex, TilerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "geotiler",
    about = "Slice GeoJSON into vector tiles and print one tile or the index statistics",
    version
)]
struct Args {
    /// Input GeoJSON file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Zoom of the tile to print
    #[arg(long)]
    zoom: Option<u8>,

    /// Column of the tile to print (wraps around the world)
    #[arg(long, allow_negative_numbers = true, requires_all = ["zoom", "y"], conflicts_with = "lng")]
    x: Option<i64>,

    /// Row of the tile to print
    #[arg(long, requires_all = ["zoom", "x"])]
    y: Option<i64>,

    /// Print the tile containing this longitude (or easting) instead of --x/--y
    #[arg(long, allow_negative_numbers = true, requires_all = ["zoom", "lat"])]
    lng: Option<f64>,

    /// Latitude (or northing) of the tile to print
    #[arg(long, allow_negative_numbers = true, requires_all = ["zoom", "lng"])]
    lat: Option<f64>,

    /// Maximum zoom level to preserve detail on
    #[arg(long, default_value = "14")]
    max_zoom: u8,

    /// Maximum zoom of the eagerly built part of the index
    #[arg(long, default_value = "5")]
    index_max_zoom: u8,

    /// Maximum number of points per tile in the eagerly built part of the index
    #[arg(long, default_value = "100000")]
    index_max_points: usize,

    /// Simplification tolerance (higher means simpler)
    #[arg(long, default_value = "3")]
    tolerance: f64,

    /// Tile extent
    #[arg(long, default_value = "4096")]
    extent: u32,

    /// Tile buffer on each side, in extent units
    #[arg(long, default_value = "64")]
    buffer: u32,

    /// Track clip progress along lines (mapbox_clip_start/end)
    #[arg(long)]
    line_metrics: bool,

    /// Property to promote to the feature id
    #[arg(long, value_name = "NAME", conflicts_with = "generate_id")]
    promote_id: Option<String>,

    /// Generate sequential feature ids
    #[arg(long)]
    generate_id: bool,

    /// Projection code (EPSG:mapbox, EPSG:3857, EPSG:4326 and aliases)
    #[arg(long, default_value = "EPSG:mapbox")]
    projection: String,

    /// Print tile statistics instead of a tile
    #[arg(long)]
    stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Requested tile as (z, x, y), from explicit indices or a location.
    fn tile(&self, projection: &Projection) -> Option<(u8, i64, i64)> {
        let z = self.zoom?;
        match (self.x, self.y, self.lng, self.lat) {
            (Some(x), Some(y), _, _) => Some((z, x, y)),
            (_, _, Some(lng), Some(lat)) => {
                let coord = lng_lat_to_tile(lng, lat, z, projection);
                Some((z, coord.x as i64, coord.y as i64))
            }
            _ => None,
        }
    }

    fn config(&self) -> TilerConfig {
        let mut config = TilerConfig::default()
            .with_max_zoom(self.max_zoom)
            .with_index_limits(self.index_max_zoom.min(self.max_zoom), self.index_max_points)
            .with_tolerance(self.tolerance)
            .with_extent(self.extent)
            .with_buffer(self.buffer)
            .with_line_metrics(self.line_metrics)
            .with_generate_id(self.generate_id)
            .with_debug(if self.verbose {
                2
            } else if self.stats || self.zoom.is_none() {
                1
            } else {
                0
            });
        if let Some(property) = &self.promote_id {
            config = config.with_promote_id(property.as_str());
        }
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.index_max_zoom > args.max_zoom {
        log::warn!(
            "--index-max-zoom {} exceeds --max-zoom {}, using {}",
            args.index_max_zoom,
            args.max_zoom,
            args.max_zoom
        );
    }

    let registry = ProjectionRegistry::with_defaults();
    let projection = registry
        .get(&args.projection)
        .with_context(|| format!("Unknown projection: {}", args.projection))?;

    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut index = TileIndex::from_json_str(&input, args.config(), projection.clone())
        .context("Failed to build tile index")?;

    match args.tile(&projection) {
        Some((z, x, y)) if !args.stats => {
            let world_size = i64::from(projection.world_size(z));
            if (0..world_size).contains(&y) {
                let wrapped = x.rem_euclid(world_size);
                log::info!(
                    "Tile {}/{}/{} covers {}",
                    z,
                    x,
                    y,
                    projection.tile_bbox_string(&TileCoord::new(wrapped as u32, y as u32, z))
                );
            }
            let collection = match index.get_tile(z, x, y) {
                Some(tile) => tile.to_geojson(&projection),
                None => {
                    log::info!("Tile {}/{}/{} has no data", z, x, y);
                    geojson::FeatureCollection {
                        bbox: None,
                        features: Vec::new(),
                        foreign_members: None,
                    }
                }
            };
            let output = serde_json::to_string_pretty(&collection)
                .context("Failed to serialize tile")?;
            println!("{}", output);
        }
        _ => {
            println!("projection: {} ({})", projection.code(), projection.units());
            println!("strategy: {:?}", index.strategy());
            println!("tiles: {}", index.total());
            for (zoom, count) in index.stats() {
                println!("  z{}: {}", zoom, count);
            }
        }
    }

    Ok(())
}
