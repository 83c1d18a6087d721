//! Error types for the tile engine.

use thiserror::Error;

use crate::style::StyleError;
use crate::tile::TileCoord;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile generation.
///
/// `InvalidBounds`, `InvalidInput`, `InvalidStyle`, `DegenerateGeometry` and
/// `WorkerPool` abort a run before any tile is produced. `TileRender` and
/// `Write` describe a single tile and end up in the run report instead.
#[derive(Debug, Error)]
pub enum TileError {
    // === Run-level errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Degenerate geometry: {valid_points} valid points cannot be triangulated")]
    DegenerateGeometry { valid_points: usize },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    // === Per-tile errors ===
    #[error("Rendering tile {coord} failed: {reason}")]
    TileRender { coord: TileCoord, reason: String },

    #[error("Writing tile {coord} failed: {reason}")]
    Write { coord: TileCoord, reason: String },

    // === Infrastructure ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TileError {
    /// Whether this error is scoped to one tile (recoverable within a run).
    pub fn is_tile_local(&self) -> bool {
        matches!(self, TileError::TileRender { .. } | TileError::Write { .. })
    }

    /// The tile this error belongs to, if it is tile-local.
    pub fn coord(&self) -> Option<TileCoord> {
        match self {
            TileError::TileRender { coord, .. } | TileError::Write { coord, .. } => Some(*coord),
            _ => None,
        }
    }
}

impl From<StyleError> for TileError {
    fn from(err: StyleError) -> Self {
        TileError::InvalidStyle(err.to_string())
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        TileError::InvalidInput(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_local_classification() {
        let coord = TileCoord::new(3, 4, 2);
        let render = TileError::TileRender {
            coord,
            reason: "overflow".to_string(),
        };
        assert!(render.is_tile_local());
        assert_eq!(render.coord(), Some(coord));
        assert_eq!(render.to_string(), "Rendering tile 3/4/2 failed: overflow");

        let fatal = TileError::DegenerateGeometry { valid_points: 2 };
        assert!(!fatal.is_tile_local());
        assert_eq!(fatal.coord(), None);
    }
}
