//! Tile rendering for triangulated scalar fields.
//!
//! Implements two strategies behind the [`TileRenderer`] trait:
//! - Filled contours: band fragments clipped from the mesh and filled as polygons
//! - Sampled: per-pixel point location and interpolation
//!
//! Both can overlay iso-lines and produce straight-alpha RGBA tiles that are
//! encoded to PNG by hand (deflate via flate2, CRC via crc32fast).

pub mod bands;
pub mod contour;
pub mod error;
pub mod png;
pub mod raster;
pub mod sample;
pub mod tile;

pub use bands::{extract_fragments, filter_fragments, Fragment};
pub use error::{RenderError, RenderResult};
pub use png::{encode_png, PngEncoding};
pub use tile::{
    create_renderer, ContourTileRenderer, RenderContext, RenderStrategy, TileImage, TileRenderer,
};
pub use sample::SampledTileRenderer;
