//! Runs tile tasks on a bounded rayon pool.
//!
//! Every task is isolated: render and write errors as well as panics are
//! recorded in the report and never stop the other tiles. Cancellation is
//! checked before a task starts, so in-flight tiles always finish.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use metrics::counter;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use renderer::{TileImage, TileRenderer};
use tile_common::tile::TileCoord;
use tile_common::{TileError, TileResult};

use crate::cancel::CancellationToken;
use crate::config::{EmptyTilePolicy, EngineConfig};
use crate::report::{FailureKind, TileFailure, TileOutcome, TileRunReport};
use crate::writer::TileWriter;

/// Log progress every this many finished tiles.
const PROGRESS_INTERVAL: usize = 100;

/// Build the worker pool for a run.
pub fn build_pool(workers: usize) -> TileResult<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("seatile-worker-{}", i))
        .build()
        .map_err(|e| TileError::WorkerPool(e.to_string()))
}

/// Everything a task needs, borrowed for the duration of one zoom level.
pub struct Dispatcher<'a> {
    renderer: &'a dyn TileRenderer,
    writer: &'a TileWriter,
    config: &'a EngineConfig,
    cancel: &'a CancellationToken,
    deadline: Option<Instant>,
    /// `false` when the data cannot reach any tile; every tile is then empty
    has_data: bool,
    finished: AtomicUsize,
    stopped: AtomicBool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        renderer: &'a dyn TileRenderer,
        writer: &'a TileWriter,
        config: &'a EngineConfig,
        cancel: &'a CancellationToken,
        deadline: Option<Instant>,
        has_data: bool,
    ) -> Self {
        Self {
            renderer,
            writer,
            config,
            cancel,
            deadline,
            has_data,
            finished: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Process `tiles` on `pool` and block until all of them are accounted for.
    pub fn run(&self, pool: &ThreadPool, tiles: &[TileCoord]) -> TileRunReport {
        let start = Instant::now();
        let total = tiles.len();

        let outcomes: Vec<TileOutcome> =
            pool.install(|| tiles.par_iter().map(|&coord| self.process(coord, total)).collect());

        let mut report = TileRunReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        report.cancelled = self.stopped.load(Ordering::SeqCst);
        report.elapsed = start.elapsed();
        report
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    fn process(&self, coord: TileCoord, total: usize) -> TileOutcome {
        if self.should_stop() {
            if !self.stopped.swap(true, Ordering::SeqCst) {
                warn!(tile = %coord, "Run cancelled, no further tiles will start");
            }
            return TileOutcome::NotAttempted;
        }

        let outcome = if !self.config.force && self.writer.exists(coord) {
            debug!(tile = %coord, "Tile exists, skipping");
            TileOutcome::Skipped
        } else {
            match panic::catch_unwind(AssertUnwindSafe(|| self.render_and_write(coord))) {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    warn!(tile = %coord, error = %err, "Tile failed");
                    TileOutcome::Failed(TileFailure::from_error(coord, &err))
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(tile = %coord, reason = %reason, "Tile task panicked");
                    TileOutcome::Failed(TileFailure {
                        coord,
                        kind: FailureKind::Panic,
                        reason,
                    })
                }
            }
        };

        record_metrics(&outcome);

        let finished = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if finished % PROGRESS_INTERVAL == 0 || finished == total {
            info!(
                zoom = coord.z,
                progress = format!("{}/{}", finished, total),
                "Tile progress"
            );
        }

        outcome
    }

    fn render_and_write(&self, coord: TileCoord) -> TileResult<TileOutcome> {
        let image = if self.has_data {
            self.renderer
                .render_tile(coord)
                .map_err(|e| TileError::TileRender {
                    coord,
                    reason: e.to_string(),
                })?
        } else {
            TileImage::transparent(coord)
        };

        if image.no_data && self.config.empty_tiles == EmptyTilePolicy::Skip {
            debug!(tile = %coord, "No data, leaving tile out");
            return Ok(TileOutcome::EmptySkipped);
        }

        let bytes = image
            .encode(self.config.png_encoding)
            .map_err(|e| TileError::TileRender {
                coord,
                reason: e.to_string(),
            })?;
        self.writer.write(coord, &bytes)?;

        Ok(TileOutcome::Written { empty: image.no_data })
    }
}

fn record_metrics(outcome: &TileOutcome) {
    match outcome {
        TileOutcome::Written { empty } => {
            counter!("seatile_tiles_written_total").increment(1);
            if *empty {
                counter!("seatile_tiles_empty_total").increment(1);
            }
        }
        TileOutcome::EmptySkipped => counter!("seatile_tiles_empty_total").increment(1),
        TileOutcome::Skipped => counter!("seatile_tiles_skipped_total").increment(1),
        TileOutcome::Failed(_) => counter!("seatile_tiles_failed_total").increment(1),
        TileOutcome::NotAttempted => {}
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
