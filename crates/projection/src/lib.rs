//! Coordinate transformations for slippy-map tiles.
//!
//! Implements spherical Web-Mercator (EPSG:3857) from scratch without
//! external dependencies, plus the per-tile pixel frame renderers draw into.

pub mod mercator;

pub use mercator::{
    lonlat_to_mercator, mercator_to_lonlat, tile_mercator_bounds, PixelFrame, EARTH_RADIUS,
    ORIGIN_SHIFT,
};
