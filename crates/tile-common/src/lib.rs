//! Common types shared across the tile engine crates.

pub mod bbox;
pub mod error;
pub mod style;
pub mod tile;

pub use bbox::{BoundingBox, GeoBounds, MAX_MERCATOR_LAT};
pub use error::{TileError, TileResult};
pub use style::{
    Band, BandSet, Color, ColorScale, ColorStop, Colormap, ColormapSpec, ContourLineStyle, Extend,
    LevelSpec, ResolvedContourLines, ResolvedStyle, StyleConfig, StyleError,
};
pub use tile::{tile_bbox, tiles_for_bounds, TileBufferConfig, TileCoord, TILE_SIZE};
