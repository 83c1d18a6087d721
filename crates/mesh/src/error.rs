//! Errors raised while preparing the mesh.

use thiserror::Error;

use tile_common::TileError;

pub type MeshResult<T> = Result<T, MeshError>;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Cannot triangulate {valid_points} valid points")]
    Degenerate { valid_points: usize },

    #[error("Invalid field: {0}")]
    InvalidInput(String),
}

impl From<MeshError> for TileError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::Degenerate { valid_points } => TileError::DegenerateGeometry { valid_points },
            MeshError::InvalidInput(msg) => TileError::InvalidInput(msg),
        }
    }
}
