//! Rendering errors.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Failure while rendering or encoding a single tile.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Canvas error: {0}")]
    Canvas(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Encode(err.to_string())
    }
}
