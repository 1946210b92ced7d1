//! Quantization of tile geometry to integer tile coordinates.

use geo::Coord;

use crate::builder::Tile;
use crate::projection::Projection;

/// Quantize every feature of `tile` into `[-buffer, extent + buffer]`.
///
/// Runs once per tile; later calls return immediately. The simplified
/// world-unit geometry is released afterwards.
pub fn transform_tile(tile: &mut Tile, extent: u32, buffer: u32, projection: &Projection) {
    if tile.transformed {
        return;
    }

    let scale = projection.zoom_scale(tile.coord.z as f64);
    let (tx, ty) = (tile.coord.x as f64, tile.coord.y as f64);

    for feature in &mut tile.features {
        let simplified = std::mem::take(&mut feature.simplified);
        feature.geometry = simplified
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|p| transform_point(p.x, p.y, extent, buffer, scale, tx, ty))
                    .collect()
            })
            .collect();
    }

    tile.transformed = true;
}

/// Map a world-unit point into the integer space of tile `(tx, ty)`.
pub fn transform_point(
    x: f64,
    y: f64,
    extent: u32,
    buffer: u32,
    scale: f64,
    tx: f64,
    ty: f64,
) -> Coord<i32> {
    let extent_f = extent as f64;
    let min = -(buffer as f64);
    let max = extent_f + buffer as f64;

    Coord {
        x: (extent_f * (x * scale - tx)).round().clamp(min, max) as i32,
        y: (extent_f * (y * scale - ty)).round().clamp(min, max) as i32,
    }
}
