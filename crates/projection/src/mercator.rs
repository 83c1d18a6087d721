//! Spherical Web-Mercator projection (EPSG:3857).
//!
//! All tile geometry is computed in Mercator meters. Tile edges are exact
//! multiples of the world extent, so neighbouring tiles share bit-identical
//! edges and pixel centres line up across tile boundaries.

use std::f64::consts::PI;

use tile_common::bbox::{BoundingBox, MAX_MERCATOR_LAT};
use tile_common::tile::{tiles_per_axis, TileCoord, TILE_SIZE};

/// WGS84 semi-major axis used as the sphere radius (meters).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the Mercator world (meters).
pub const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

/// Project lon/lat degrees to Mercator meters.
///
/// Latitudes beyond the Mercator limit are clamped to it.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}

/// Inverse projection from Mercator meters to lon/lat degrees.
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Mercator extent of a tile; `min_x/max_x` are easting, `min_y/max_y` northing.
pub fn tile_mercator_bounds(coord: &TileCoord) -> BoundingBox {
    let span = 2.0 * ORIGIN_SHIFT / tiles_per_axis(coord.z) as f64;
    let min_x = -ORIGIN_SHIFT + coord.x as f64 * span;
    let max_y = ORIGIN_SHIFT - coord.y as f64 * span;
    BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
}

/// Affine map from Mercator meters to the pixel grid of one tile.
///
/// Pixel (0, 0) is the north-west corner; x grows east and y grows south.
/// Pixel `(i, j)` covers `[i, i+1) × [j, j+1)` and is sampled at its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelFrame {
    bounds: BoundingBox,
    size: u32,
}

impl PixelFrame {
    pub fn new(bounds: BoundingBox, size: u32) -> Self {
        Self { bounds, size }
    }

    /// Frame of a standard 256 px tile.
    pub fn for_tile(coord: &TileCoord) -> Self {
        Self::new(tile_mercator_bounds(coord), TILE_SIZE)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Mercator extent covered by the frame.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Mercator meters to fractional pixel coordinates.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let scale_x = self.size as f64 / self.bounds.width();
        let scale_y = self.size as f64 / self.bounds.height();
        (
            (x - self.bounds.min_x) * scale_x,
            (self.bounds.max_y - y) * scale_y,
        )
    }

    /// Fractional pixel coordinates back to Mercator meters.
    pub fn to_mercator(&self, px: f64, py: f64) -> (f64, f64) {
        let per_x = self.bounds.width() / self.size as f64;
        let per_y = self.bounds.height() / self.size as f64;
        (
            self.bounds.min_x + px * per_x,
            self.bounds.max_y - py * per_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_common::tile::tile_bbox;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_origin_and_corners() {
        let (x, y) = lonlat_to_mercator(0.0, 0.0);
        assert!(approx(x, 0.0, 1e-9));
        assert!(approx(y, 0.0, 1e-9));

        let (x, y) = lonlat_to_mercator(180.0, MAX_MERCATOR_LAT);
        assert!(approx(x, ORIGIN_SHIFT, 1e-6));
        assert!(approx(y, ORIGIN_SHIFT, 1e-3));
    }

    #[test]
    fn test_round_trip() {
        for &(lon, lat) in &[(-10.0, 45.0), (30.0, 65.0), (151.2, -33.9), (-179.5, 80.0)] {
            let (x, y) = lonlat_to_mercator(lon, lat);
            let (lon2, lat2) = mercator_to_lonlat(x, y);
            assert!(approx(lon, lon2, 1e-9));
            assert!(approx(lat, lat2, 1e-9));
        }
    }

    #[test]
    fn test_polar_latitudes_clamp() {
        let (_, y_pole) = lonlat_to_mercator(0.0, 90.0);
        let (_, y_limit) = lonlat_to_mercator(0.0, MAX_MERCATOR_LAT);
        assert_eq!(y_pole, y_limit);
        assert!(y_pole.is_finite());
    }

    #[test]
    fn test_tile_bounds_match_lonlat_tile_bbox() {
        let coord = TileCoord::new(3, 5, 2);
        let merc = tile_mercator_bounds(&coord);
        let geo = tile_bbox(&coord);

        let (west, south) = mercator_to_lonlat(merc.min_x, merc.min_y);
        let (east, north) = mercator_to_lonlat(merc.max_x, merc.max_y);
        assert!(approx(west, geo.min_x, 1e-9));
        assert!(approx(east, geo.max_x, 1e-9));
        assert!(approx(south, geo.min_y, 1e-9));
        assert!(approx(north, geo.max_y, 1e-9));
    }

    #[test]
    fn test_neighbouring_tiles_share_edges() {
        let left = tile_mercator_bounds(&TileCoord::new(6, 10, 20));
        let right = tile_mercator_bounds(&TileCoord::new(6, 11, 20));
        let below = tile_mercator_bounds(&TileCoord::new(6, 10, 21));
        assert_eq!(left.max_x, right.min_x);
        assert_eq!(left.min_y, below.max_y);
    }

    #[test]
    fn test_pixel_frame_corners() {
        let frame = PixelFrame::for_tile(&TileCoord::new(1, 1, 0));
        let b = frame.bounds();

        let (px, py) = frame.to_pixel(b.min_x, b.max_y);
        assert!(approx(px, 0.0, 1e-9) && approx(py, 0.0, 1e-9));

        let (px, py) = frame.to_pixel(b.max_x, b.min_y);
        assert!(approx(px, 256.0, 1e-9) && approx(py, 256.0, 1e-9));

        let (x, y) = frame.to_mercator(128.0, 128.0);
        assert!(approx(x, ORIGIN_SHIFT / 2.0, 1e-6));
        assert!(approx(y, ORIGIN_SHIFT / 2.0, 1e-6));
    }

    #[test]
    fn test_pixel_centres_lie_inside_tile() {
        let coord = TileCoord::new(4, 8, 5);
        let frame = PixelFrame::for_tile(&coord);
        let geo = tile_bbox(&coord);
        for &(i, j) in &[(0.5, 0.5), (255.5, 255.5), (17.5, 200.5)] {
            let (x, y) = frame.to_mercator(i, j);
            let (lon, lat) = mercator_to_lonlat(x, y);
            assert!(geo.contains_point(lon, lat));
        }
    }
}
