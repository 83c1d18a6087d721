//! Tile pyramid generation for triangulated scalar fields.
//!
//! [`generate_tiles`] and [`TileEngine::run`] take a field, bounds, zoom
//! levels and a style and write `{z}/{x}/{y}.png` tiles using a bounded
//! worker pool, returning a [`TileRunReport`].

pub mod cancel;
pub mod config;
pub mod coverage;
pub mod dispatch;
pub mod engine;
pub mod report;
pub mod writer;

pub use cancel::CancellationToken;
pub use config::{EmptyTilePolicy, EngineConfig};
pub use coverage::{diagnose_coverage, CoverageDiagnostics};
pub use engine::{generate_tiles, TileEngine};
pub use report::{FailureKind, TileFailure, TileOutcome, TileRunReport};
pub use writer::TileWriter;
