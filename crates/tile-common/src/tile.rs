//! XYZ (slippy map) tile addressing for the Web-Mercator tile pyramid.
//!
//! Tiles are addressed by (zoom, column, row) on a 2^z × 2^z grid with the
//! origin at the north-west corner. Bounding boxes are derived with the
//! standard inverse Web-Mercator transform of the tile corners.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bbox::{BoundingBox, GeoBounds, MAX_MERCATOR_LAT};

/// Output tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest zoom level accepted by the enumerator (2^30 columns still fit u32).
pub const MAX_ZOOM: u32 = 30;

/// Address of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u32,
    /// Column, counted eastward from the antimeridian
    pub x: u32,
    /// Row, counted southward from the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Path of this tile relative to the pyramid root: `{z}/{x}/{y}.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.png", self.y))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u32) -> u32 {
    1u32 << zoom
}

/// Tile containing a lat/lon point; points off the grid clamp to its edge.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let n = tiles_per_axis(zoom) as f64;
    let last = n - 1.0;

    let merc_y = lat
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        .to_radians()
        .tan()
        .asinh();
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, last);
    let y = ((1.0 - merc_y / std::f64::consts::PI) / 2.0 * n).floor().clamp(0.0, last);

    TileCoord::new(zoom, x as u32, y as u32)
}

/// Latitude of the north edge of row `y` on an `n`-row grid.
fn row_edge_lat(y: u32, n: f64) -> f64 {
    let t = std::f64::consts::PI * (1.0 - 2.0 * y as f64 / n);
    t.sinh().atan().to_degrees()
}

/// Lon/lat extent of a tile.
pub fn tile_bbox(coord: &TileCoord) -> BoundingBox {
    let n = tiles_per_axis(coord.z) as f64;
    let lon_at = |x: u32| x as f64 * 360.0 / n - 180.0;
    BoundingBox::new(
        lon_at(coord.x),
        row_edge_lat(coord.y + 1, n),
        lon_at(coord.x + 1),
        row_edge_lat(coord.y, n),
    )
}

/// Enumerate every tile at `zoom` whose bounding box intersects `bounds`.
///
/// Intersection is closed on both axes: a tile that only shares an edge with
/// the bounds is included. The candidate window comes from the corner tiles,
/// widened by one tile so that exact edge contact is never lost to rounding,
/// and each candidate is confirmed with the same test `brute_force_tiles`
/// uses. Output is column-major (x, then y) and deterministic.
pub fn tiles_for_bounds(bounds: &GeoBounds, zoom: u32) -> Vec<TileCoord> {
    let area = bounds.mercator_bbox();
    if area.min_y > area.max_y {
        return Vec::new();
    }

    let last = tiles_per_axis(zoom) - 1;
    let north_west = latlon_to_tile(area.max_y, area.min_x, zoom);
    let south_east = latlon_to_tile(area.min_y, area.max_x, zoom);

    let x_start = north_west.x.min(south_east.x).saturating_sub(1);
    let x_end = (north_west.x.max(south_east.x) + 1).min(last);
    let y_start = north_west.y.min(south_east.y).saturating_sub(1);
    let y_end = (north_west.y.max(south_east.y) + 1).min(last);

    let mut tiles = Vec::with_capacity(window_capacity(x_end - x_start + 1, y_end - y_start + 1));
    for x in x_start..=x_end {
        for y in y_start..=y_end {
            let coord = TileCoord::new(zoom, x, y);
            if tile_bbox(&coord).touches(&area) {
                tiles.push(coord);
            }
        }
    }
    tiles
}

/// Upper bound on tiles kept up front when enumerating a candidate window.
const MAX_PREALLOCATED_TILES: usize = 1 << 16;

/// Capacity hint for a `columns × rows` window, saturating instead of
/// overflowing at high zoom.
fn window_capacity(columns: u32, rows: u32) -> usize {
    (columns as usize)
        .checked_mul(rows as usize)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATED_TILES)
}

/// Reference enumeration over the full 2^z × 2^z grid.
///
/// Quadratic in the grid size; meant for verification at low zoom.
pub fn brute_force_tiles(bounds: &GeoBounds, zoom: u32) -> Vec<TileCoord> {
    let area = bounds.mercator_bbox();
    let n = tiles_per_axis(zoom);
    let mut tiles = Vec::new();
    for x in 0..n {
        for y in 0..n {
            let coord = TileCoord::new(zoom, x, y);
            if tile_bbox(&coord).touches(&area) {
                tiles.push(coord);
            }
        }
    }
    tiles
}

/// Configuration for the pixel margin rendered around each tile.
///
/// Geometry within the margin is included when a tile is rendered so that
/// bands crossing a tile edge are drawn identically by both neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBufferConfig {
    /// Margin on each side, in pixels
    pub buffer_pixels: u32,
    /// Pixels across the unexpanded window
    pub tile_size: u32,
}

impl Default for TileBufferConfig {
    fn default() -> Self {
        Self {
            buffer_pixels: 2,
            tile_size: TILE_SIZE,
        }
    }
}

impl TileBufferConfig {
    /// Default margin unless `SEATILE_BUFFER_PIXELS` holds a pixel count.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(pixels) = std::env::var("SEATILE_BUFFER_PIXELS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            config.buffer_pixels = pixels;
        }
        config
    }

    /// `window` grown by the margin, converted with the window's own units per pixel.
    pub fn expanded_bbox(&self, window: &BoundingBox) -> BoundingBox {
        if self.buffer_pixels == 0 {
            return *window;
        }
        let per_pixel_x = window.width() / self.tile_size as f64;
        let per_pixel_y = window.height() / self.tile_size as f64;
        let margin = self.buffer_pixels as f64;
        window.expand(margin * per_pixel_x, margin * per_pixel_y)
    }
}
