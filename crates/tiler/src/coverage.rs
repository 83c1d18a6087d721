//! Per-zoom coverage diagnostics.
//!
//! Logged before each zoom level is dispatched so a run that produces only
//! transparent tiles can be traced back to bounds that miss the data.

use serde::Serialize;
use tracing::{info, warn};

use mesh::SpatialIndex;
use tile_common::bbox::{BoundingBox, GeoBounds};
use tile_common::tile::{tile_bbox, TileCoord};

/// Number of example tiles included in the diagnostics.
const SAMPLE_TILES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageDiagnostics {
    pub zoom: u32,
    pub tiles: usize,
    pub bounds: BoundingBox,
    /// Lon/lat extent of the triangulated samples
    pub data_extent: Option<BoundingBox>,
    pub data_overlaps_bounds: bool,
    /// First few tiles of the zoom with their lon/lat boxes
    pub sample_tiles: Vec<(TileCoord, BoundingBox)>,
}

/// Compare the data extent with the bounds and the enumerated tiles.
pub fn diagnose_coverage(
    index: &SpatialIndex,
    bounds: &GeoBounds,
    zoom: u32,
    tiles: &[TileCoord],
) -> CoverageDiagnostics {
    let diagnostics = CoverageDiagnostics {
        zoom,
        tiles: tiles.len(),
        bounds: bounds.bbox(),
        data_extent: index.data_extent(),
        data_overlaps_bounds: index.overlaps_bounds(bounds),
        sample_tiles: tiles
            .iter()
            .take(SAMPLE_TILES)
            .map(|coord| (*coord, tile_bbox(coord)))
            .collect(),
    };

    info!(
        zoom,
        tiles = diagnostics.tiles,
        bounds = ?diagnostics.bounds,
        data_extent = ?diagnostics.data_extent,
        sample_tiles = ?diagnostics.sample_tiles,
        "Zoom coverage"
    );
    if !diagnostics.data_overlaps_bounds {
        warn!(zoom, "Data extent does not reach the bounds; every tile will be empty");
    }

    diagnostics
}
