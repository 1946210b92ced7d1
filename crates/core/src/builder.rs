//! Tile construction from clipped features.
//!
//! A [`Tile`] keeps the simplified geometry of every feature in world units
//! until it is first requested; quantization to integer tile coordinates is
//! done by [`crate::transform`].

use std::sync::Arc;

use geo::Coord;
use geojson::feature::Id;
use geojson::JsonObject;

use crate::feature::{Slice, VtFeature, VtGeometry};
use crate::projection::Projection;
use crate::tile::TileCoord;
use crate::TilerConfig;

/// Geometry type of a tile feature (numbering follows the vector tile spec)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Point = 1,
    LineString = 2,
    Polygon = 3,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Point => "Point",
            FeatureKind::LineString => "LineString",
            FeatureKind::Polygon => "Polygon",
        }
    }
}

/// Progress of a clipped line along its source line, in projected units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Length of the whole source line
    pub size: f64,
    /// Distance along the source line where this piece starts
    pub start: f64,
    /// Distance along the source line where this piece ends
    pub end: f64,
}

impl LineMetrics {
    /// `start / size`, the value exposed as `mapbox_clip_start`.
    pub fn clip_start(&self) -> f64 {
        self.start / self.size
    }

    /// `end / size`, the value exposed as `mapbox_clip_end`.
    pub fn clip_end(&self) -> f64 {
        self.end / self.size
    }
}

/// One feature's contribution to a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFeature {
    pub kind: FeatureKind,
    /// Quantized rings (one single-vertex ring per point for point features)
    pub geometry: Vec<Vec<Coord<i32>>>,
    pub id: Option<Id>,
    pub properties: Option<Arc<JsonObject>>,
    pub line_metrics: Option<LineMetrics>,
    pub extent: u32,
    /// Simplified rings in world units, drained on quantization
    pub(crate) simplified: Vec<Vec<Coord<f64>>>,
}

impl TileFeature {
    /// Total number of quantized vertices.
    pub fn num_vertices(&self) -> usize {
        self.geometry.iter().map(Vec::len).sum()
    }
}

/// A node of the tile quad-tree.
#[derive(Debug, Clone)]
pub struct Tile {
    pub coord: TileCoord,
    pub num_features: usize,
    pub num_points: usize,
    pub num_simplified: usize,
    /// Bounding box of all features in world units
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub(crate) features: Vec<TileFeature>,
    pub(crate) source: Option<Vec<Arc<VtFeature>>>,
    pub(crate) transformed: bool,
}

impl Tile {
    /// Features of this tile.
    ///
    /// Geometry is quantized once the tile has been returned by
    /// [`TileIndex::get_tile`](crate::TileIndex::get_tile).
    pub fn features(&self) -> &[TileFeature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether the tile still retains its pre-clip source features.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_transformed(&self) -> bool {
        self.transformed
    }
}

/// Build a tile from features already clipped to it.
///
/// Vertices are filtered by their importance against the zoom's tolerance
/// (everything is kept at `max_zoom`), and polygon rings are rewound so outer
/// rings are clockwise in tile space.
pub fn create_tile(
    features: &[Arc<VtFeature>],
    coord: TileCoord,
    config: &TilerConfig,
    projection: &Projection,
) -> Tile {
    let tolerance = if coord.z == config.max_zoom {
        0.0
    } else {
        config.tolerance / (projection.zoom_scale(coord.z as f64) * config.extent as f64)
    };

    let mut tile = Tile {
        coord,
        num_features: 0,
        num_points: 0,
        num_simplified: 0,
        min_x: 2.0,
        min_y: 1.0,
        max_x: -1.0,
        max_y: 0.0,
        features: Vec::new(),
        source: None,
        transformed: false,
    };

    for feature in features {
        tile.num_features += 1;
        add_feature(&mut tile, feature, tolerance, config);

        tile.min_x = tile.min_x.min(feature.min_x);
        tile.min_y = tile.min_y.min(feature.min_y);
        tile.max_x = tile.max_x.max(feature.max_x);
        tile.max_y = tile.max_y.max(feature.max_y);
    }

    tile
}

fn add_feature(tile: &mut Tile, feature: &VtFeature, tolerance: f64, config: &TilerConfig) {
    let mut simplified: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut line_metrics = None;

    let kind = match &feature.geometry {
        VtGeometry::Point(coords) | VtGeometry::MultiPoint(coords) => {
            for point in coords.chunks_exact(3) {
                simplified.push(vec![Coord {
                    x: point[0],
                    y: point[1],
                }]);
                tile.num_points += 1;
                tile.num_simplified += 1;
            }
            FeatureKind::Point
        }
        VtGeometry::LineString(line) => {
            add_line(&mut simplified, line, tile, tolerance, false, false);
            if config.line_metrics {
                line_metrics = Some(LineMetrics {
                    size: line.size,
                    start: line.start,
                    end: line.end,
                });
            }
            FeatureKind::LineString
        }
        VtGeometry::MultiLineString(lines) => {
            for line in lines {
                add_line(&mut simplified, line, tile, tolerance, false, false);
            }
            FeatureKind::LineString
        }
        VtGeometry::Polygon(rings) => {
            for (i, ring) in rings.iter().enumerate() {
                add_line(&mut simplified, ring, tile, tolerance, true, i == 0);
            }
            FeatureKind::Polygon
        }
        VtGeometry::MultiPolygon(polygons) => {
            for rings in polygons {
                for (i, ring) in rings.iter().enumerate() {
                    add_line(&mut simplified, ring, tile, tolerance, true, i == 0);
                }
            }
            FeatureKind::Polygon
        }
    };

    if simplified.is_empty() {
        return;
    }

    tile.features.push(TileFeature {
        kind,
        geometry: Vec::new(),
        id: feature.id.clone(),
        properties: feature.properties.clone(),
        line_metrics,
        extent: config.extent,
        simplified,
    });
}

fn add_line(
    result: &mut Vec<Vec<Coord<f64>>>,
    geom: &Slice,
    tile: &mut Tile,
    tolerance: f64,
    is_polygon: bool,
    is_outer: bool,
) {
    let sq_tolerance = tolerance * tolerance;

    // Too small to show at this zoom
    if tolerance > 0.0 && geom.size < if is_polygon { sq_tolerance } else { tolerance } {
        tile.num_points += geom.len();
        return;
    }

    let mut ring = Vec::with_capacity(geom.len());
    for point in geom.coords.chunks_exact(3) {
        if tolerance == 0.0 || point[2] > sq_tolerance {
            tile.num_simplified += 1;
            ring.push(Coord {
                x: point[0],
                y: point[1],
            });
        }
        tile.num_points += 1;
    }

    if is_polygon {
        rewind(&mut ring, is_outer);
    }
    result.push(ring);
}

/// Reverse the ring unless it already winds the requested way (y pointing down).
fn rewind(ring: &mut [Coord<f64>], clockwise: bool) {
    let n = ring.len();
    if n == 0 {
        return;
    }
    let mut area = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        area += (ring[i].x - ring[j].x) * (ring[i].y + ring[j].y);
        j = i;
    }
    if (area > 0.0) == clockwise {
        ring.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(points: &[(f64, f64, f64)], size: f64) -> Slice {
        let coords = points.iter().flat_map(|&(x, y, z)| [x, y, z]).collect();
        Slice::new(coords, size)
    }

    fn ring_area(ring: &[Coord<f64>]) -> f64 {
        let n = ring.len();
        let mut sum = 0.0;
        let mut j = n - 1;
        for i in 0..n {
            sum += (ring[j].x - ring[i].x) * (ring[i].y + ring[j].y);
            j = i;
        }
        sum
    }

    #[test]
    fn test_counts_and_bbox() {
        let features = vec![
            Arc::new(VtFeature::new(
                None,
                VtGeometry::MultiPoint(vec![0.1, 0.2, 0.0, 0.3, 0.4, 0.0]),
                None,
            )),
            Arc::new(VtFeature::new(
                None,
                VtGeometry::LineString(slice(&[(0.0, 0.5, 1.0), (0.5, 0.5, 1.0)], 0.5)),
                None,
            )),
        ];
        let tile = create_tile(
            &features,
            TileCoord::new(0, 0, 0),
            &TilerConfig::default(),
            &Projection::web_mercator(),
        );
        assert_eq!(tile.num_features, 2);
        assert_eq!(tile.num_points, 4);
        assert_eq!(tile.num_simplified, 4);
        assert_eq!((tile.min_x, tile.min_y, tile.max_x, tile.max_y), (0.0, 0.2, 0.5, 0.5));
        assert_eq!(tile.features()[0].kind, FeatureKind::Point);
        assert_eq!(tile.features()[0].simplified.len(), 2, "one ring per point");
        assert!(!tile.is_transformed());
    }

    #[test]
    fn test_importance_filters_vertices_by_zoom() {
        // Middle vertex became significant at a tiny squared distance
        let line = slice(&[(0.0, 0.0, 1.0), (0.5, 0.0, 1e-14), (1.0, 0.0, 1.0)], 1.0);
        let features = vec![Arc::new(VtFeature::new(None, VtGeometry::LineString(line), None))];
        let config = TilerConfig::default();
        let projection = Projection::web_mercator();

        let shallow = create_tile(&features, TileCoord::new(0, 0, 0), &config, &projection);
        assert_eq!(shallow.features()[0].simplified[0].len(), 2);
        assert_eq!(shallow.num_simplified, 2);
        assert_eq!(shallow.num_points, 3);

        let deepest = create_tile(&features, TileCoord::new(0, 0, 14), &config, &projection);
        assert_eq!(deepest.features()[0].simplified[0].len(), 3, "max zoom keeps everything");
    }

    #[test]
    fn test_tiny_rings_are_dropped() {
        let speck = slice(
            &[(0.5, 0.5, 1.0), (0.5, 0.5000001, 1.0), (0.5000001, 0.5, 1.0), (0.5, 0.5, 1.0)],
            1e-15,
        );
        let features = vec![Arc::new(VtFeature::new(None, VtGeometry::Polygon(vec![speck]), None))];
        let tile = create_tile(
            &features,
            TileCoord::new(0, 0, 0),
            &TilerConfig::default(),
            &Projection::web_mercator(),
        );
        assert!(tile.is_empty());
        assert_eq!(tile.num_features, 1);
        assert_eq!(tile.num_points, 4, "dropped rings still count as points");
    }

    #[test]
    fn test_rings_are_rewound() {
        // Outer ring given counter-clockwise on screen, hole given clockwise
        let outer = slice(
            &[(0.1, 0.1, 1.0), (0.1, 0.9, 1.0), (0.9, 0.9, 1.0), (0.9, 0.1, 1.0), (0.1, 0.1, 1.0)],
            0.64,
        );
        let hole = slice(
            &[(0.4, 0.4, 1.0), (0.6, 0.4, 1.0), (0.6, 0.6, 1.0), (0.4, 0.6, 1.0), (0.4, 0.4, 1.0)],
            0.04,
        );
        let original_outer = ring_area(
            &[(0.1, 0.1), (0.1, 0.9), (0.9, 0.9), (0.9, 0.1), (0.1, 0.1)]
                .iter()
                .map(|&(x, y)| Coord { x, y })
                .collect::<Vec<_>>(),
        );
        let features = vec![Arc::new(VtFeature::new(
            None,
            VtGeometry::Polygon(vec![outer, hole]),
            None,
        ))];
        let tile = create_tile(
            &features,
            TileCoord::new(0, 0, 0),
            &TilerConfig::default(),
            &Projection::web_mercator(),
        );
        let rings = &tile.features()[0].simplified;
        assert_eq!(rings.len(), 2);
        assert!(original_outer < 0.0, "fixture should start with the wrong winding");
        assert!(ring_area(&rings[0]) > 0.0, "outer ring must have positive area");
        assert!(ring_area(&rings[1]) < 0.0, "hole must have negative area");
    }

    #[test]
    fn test_line_metrics_attached() {
        let mut line = slice(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0)], 1.0);
        line.start = 0.25;
        line.end = 0.75;
        let features = vec![Arc::new(VtFeature::new(None, VtGeometry::LineString(line), None))];
        let projection = Projection::web_mercator();

        let with = create_tile(
            &features,
            TileCoord::new(0, 0, 0),
            &TilerConfig::default().with_line_metrics(true),
            &projection,
        );
        let metrics = with.features()[0].line_metrics.unwrap();
        assert_eq!(metrics.clip_start(), 0.25);
        assert_eq!(metrics.clip_end(), 0.75);

        let without = create_tile(&features, TileCoord::new(0, 0, 0), &TilerConfig::default(), &projection);
        assert!(without.features()[0].line_metrics.is_none());
    }
}
