//! Engine entry points.
//!
//! A run validates its inputs, builds the triangulation and spatial index
//! once, resolves the style against the data and then dispatches every zoom
//! level to the worker pool. Nothing is shared between runs.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use mesh::{MeshOptions, ScalarField, SpatialIndex, Triangulation};
use renderer::{create_renderer, RenderContext};
use tile_common::bbox::GeoBounds;
use tile_common::style::StyleConfig;
use tile_common::tile::{tiles_for_bounds, MAX_ZOOM};
use tile_common::{TileError, TileResult};

use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::coverage::diagnose_coverage;
use crate::dispatch::{build_pool, Dispatcher};
use crate::report::TileRunReport;
use crate::writer::TileWriter;

/// Generates tile pyramids with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct TileEngine {
    config: EngineConfig,
    cancel: CancellationToken,
}

impl TileEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token to stop runs.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render every tile of `zoom_levels` that intersects `bounds` into `output_dir`.
    ///
    /// Fails before any file is written when the inputs are invalid or the
    /// field cannot be triangulated. Per-tile problems end up in the report.
    pub fn run(
        &self,
        bounds: &GeoBounds,
        field: &ScalarField,
        output_dir: &Path,
        zoom_levels: &[u32],
        style: &StyleConfig,
    ) -> TileResult<TileRunReport> {
        let start = Instant::now();

        let zooms = validate_zoom_levels(zoom_levels)?;
        self.config.validate()?;
        style.validate()?;

        let options = MeshOptions {
            scale: style.scale,
            max_triangle_ratio: self.config.max_triangle_ratio,
        };
        let mesh = Arc::new(Triangulation::build(field, bounds, &options)?);
        let resolved = Arc::new(style.resolve(mesh.value_range())?);
        let index = Arc::new(SpatialIndex::build(mesh));
        let has_data = index.overlaps_bounds(bounds);

        info!(
            zooms = ?zooms,
            workers = self.config.workers,
            strategy = ?self.config.strategy,
            force = self.config.force,
            vmin = resolved.vmin,
            vmax = resolved.vmax,
            bands = resolved.bands.len(),
            "Starting tile generation"
        );

        let context = RenderContext::new(Arc::clone(&index), resolved, self.config.buffer);
        let renderer = create_renderer(self.config.strategy, context);
        let writer = TileWriter::new(output_dir);
        writer.prepare()?;
        let pool = build_pool(self.config.workers)?;
        let deadline = self.config.max_runtime.map(|limit| start + limit);

        let mut report = TileRunReport::default();
        for zoom in zooms {
            let tiles = tiles_for_bounds(bounds, zoom);
            diagnose_coverage(&index, bounds, zoom, &tiles);

            let dispatcher = Dispatcher::new(
                renderer.as_ref(),
                &writer,
                &self.config,
                &self.cancel,
                deadline,
                has_data,
            );
            let zoom_report = dispatcher.run(&pool, &tiles);

            let tiles_per_sec = tiles.len() as f64 / zoom_report.elapsed.as_secs_f64().max(1e-9);
            info!(
                zoom,
                total = tiles.len(),
                written = zoom_report.written,
                skipped = zoom_report.skipped,
                empty = zoom_report.empty,
                failed = zoom_report.failed,
                not_attempted = zoom_report.not_attempted,
                duration_ms = zoom_report.elapsed.as_millis() as u64,
                tiles_per_sec = format!("{:.1}", tiles_per_sec),
                "Zoom level complete"
            );
            report.merge(zoom_report);
        }

        report.elapsed = start.elapsed();
        info!(
            written = report.written,
            skipped = report.skipped,
            empty = report.empty,
            failed = report.failed,
            not_attempted = report.not_attempted,
            cancelled = report.cancelled,
            duration_ms = report.elapsed.as_millis() as u64,
            renderer = renderer.name(),
            "Tile generation complete"
        );
        Ok(report)
    }
}

/// Ascending, de-duplicated zoom levels; rejects an empty list or zooms above [`MAX_ZOOM`].
fn validate_zoom_levels(zoom_levels: &[u32]) -> TileResult<Vec<u32>> {
    if zoom_levels.is_empty() {
        return Err(TileError::InvalidInput("no zoom levels requested".to_string()));
    }
    if let Some(&zoom) = zoom_levels.iter().find(|&&z| z > MAX_ZOOM) {
        return Err(TileError::InvalidInput(format!(
            "zoom level {} exceeds the maximum of {}",
            zoom, MAX_ZOOM
        )));
    }
    Ok(zoom_levels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect())
}

/// Generate a tile pyramid from plain arrays.
///
/// Coordinates are paired with values one-to-one when all three lengths
/// match, otherwise they are broadcast as the axes of a rectilinear grid
/// (`values.len() == latitudes.len() * longitudes.len()`, latitude-major).
/// `num_workers` defaults to the available cores minus one.
#[allow(clippy::too_many_arguments)]
pub fn generate_tiles(
    bounds: &GeoBounds,
    scalar_values: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    output_dir: impl AsRef<Path>,
    zoom_levels: &[u32],
    style: &StyleConfig,
    num_workers: Option<usize>,
    force: bool,
) -> TileResult<TileRunReport> {
    let field = ScalarField::from_arrays(scalar_values, latitudes, longitudes)?;

    let mut config = EngineConfig {
        force,
        ..Default::default()
    };
    if let Some(workers) = num_workers {
        config.workers = workers;
    }

    TileEngine::new(config).run(bounds, &field, output_dir.as_ref(), zoom_levels, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_levels_sorted_and_deduplicated() {
        assert_eq!(validate_zoom_levels(&[3, 1, 3, 0]).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_zoom_levels_rejected() {
        assert!(matches!(validate_zoom_levels(&[]), Err(TileError::InvalidInput(_))));
        assert!(matches!(validate_zoom_levels(&[2, 31]), Err(TileError::InvalidInput(_))));
        assert!(validate_zoom_levels(&[30]).is_ok());
    }
}
