//! Loading the field and style a run works from.
//!
//! A field file is JSON with three arrays. Missing samples are `null`:
//!
//! ```json
//! { "latitudes": [45.0, 46.0], "longitudes": [-10.0, -9.0, -8.0],
//!   "values": [0.1, null, 0.3, 0.4, 0.5, 0.6] }
//! ```
//!
//! Coordinates are paired one-to-one with values when all lengths match and
//! treated as grid axes otherwise.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use mesh::ScalarField;
use tile_common::bbox::{BoundingBox, GeoBounds};
use tile_common::style::StyleConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct FieldFile {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<Option<f64>>,
}

impl FieldFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse field JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read field file {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Lon/lat extent of the coordinates.
    pub fn extent(&self) -> Option<BoundingBox> {
        let lat = min_max(&self.latitudes)?;
        let lon = min_max(&self.longitudes)?;
        Some(BoundingBox::new(lon.0, lat.0, lon.1, lat.1))
    }

    pub fn into_field(self) -> Result<ScalarField> {
        let values: Vec<f64> = self.values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let field = ScalarField::from_arrays(values, self.latitudes, self.longitudes)?;
        info!(samples = field.len(), valid = field.valid_count(), "Loaded field");
        Ok(field)
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Bounds from a `min_lon,min_lat,max_lon,max_lat` string, or the field extent.
pub fn resolve_bounds(bbox: Option<&str>, field: &FieldFile) -> Result<GeoBounds> {
    let bbox = match bbox {
        Some(s) => BoundingBox::from_bbox_string(s).with_context(|| format!("Invalid bbox '{}'", s))?,
        None => field
            .extent()
            .context("Field has no finite coordinates to derive bounds from")?,
    };
    Ok(GeoBounds::from_extent(&bbox)?)
}

/// A preset name (`ssh`, `sst`, `chlorophyll`, `bathymetry`) or a style JSON file.
pub fn load_style(spec: &str) -> Result<StyleConfig> {
    if let Some(style) = StyleConfig::preset(spec) {
        return Ok(style);
    }
    StyleConfig::from_file(spec)
        .with_context(|| format!("'{}' is neither a style preset nor a readable style file", spec))
}

/// Zoom levels from `3`, `0-5` or `0,2,4-6`.
pub fn parse_zoom_levels(spec: &str) -> Result<Vec<u32>> {
    let mut zooms = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.trim().parse().with_context(|| format!("Invalid zoom '{}'", part))?;
                let hi: u32 = hi.trim().parse().with_context(|| format!("Invalid zoom '{}'", part))?;
                anyhow::ensure!(lo <= hi, "Zoom range '{}' is reversed", part);
                zooms.extend(lo..=hi);
            }
            None => zooms.push(part.parse().with_context(|| format!("Invalid zoom '{}'", part))?),
        }
    }
    anyhow::ensure!(!zooms.is_empty(), "No zoom levels in '{}'", spec);
    Ok(zooms)
}
