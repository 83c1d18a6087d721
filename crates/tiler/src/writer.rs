//! Writes encoded tiles into the `{z}/{x}/{y}.png` pyramid.
//!
//! Each tile goes to a temporary file in its destination directory and is
//! renamed over the final path, so readers never see a partial PNG and
//! concurrent writers of different tiles never interfere.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use tile_common::tile::TileCoord;
use tile_common::{TileError, TileResult};

#[derive(Debug, Clone)]
pub struct TileWriter {
    root: PathBuf,
}

impl TileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the pyramid root.
    pub fn prepare(&self) -> TileResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn tile_path(&self, coord: TileCoord) -> PathBuf {
        self.root.join(coord.relative_path())
    }

    pub fn exists(&self, coord: TileCoord) -> bool {
        self.tile_path(coord).is_file()
    }

    /// Atomically place `bytes` at the tile's path, replacing any existing file.
    pub fn write(&self, coord: TileCoord, bytes: &[u8]) -> TileResult<PathBuf> {
        let path = self.tile_path(coord);
        let write_err = |reason: String| TileError::Write { coord, reason };

        let dir = path
            .parent()
            .ok_or_else(|| write_err(format!("{} has no parent directory", path.display())))?;
        fs::create_dir_all(dir).map_err(|e| write_err(format!("create {}: {}", dir.display(), e)))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(format!("temp file: {}", e)))?;
        tmp.write_all(bytes).map_err(|e| write_err(e.to_string()))?;
        tmp.flush().map_err(|e| write_err(e.to_string()))?;
        tmp.persist(&path)
            .map_err(|e| write_err(format!("rename onto {}: {}", path.display(), e.error)))?;

        debug!(tile = %coord, bytes = bytes.len(), "Wrote tile");
        Ok(path)
    }
}
