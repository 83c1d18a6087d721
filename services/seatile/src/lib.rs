//! Library side of the `seatile` command: input loading and argument helpers.

pub mod input;

pub use input::{load_style, parse_zoom_levels, resolve_bounds, FieldFile};
