//! Aggregate outcome of a generation run.

use std::time::Duration;

use serde::Serialize;

use tile_common::tile::TileCoord;
use tile_common::TileError;

/// Why a tile failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Render,
    Write,
    Panic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileFailure {
    pub coord: TileCoord,
    pub kind: FailureKind,
    pub reason: String,
}

impl TileFailure {
    pub fn from_error(coord: TileCoord, err: &TileError) -> Self {
        let kind = match err {
            TileError::Write { .. } | TileError::Io(_) => FailureKind::Write,
            _ => FailureKind::Render,
        };
        let reason = match err {
            TileError::TileRender { reason, .. } | TileError::Write { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self { coord, kind, reason }
    }
}

/// What happened to a single tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    /// PNG written; `empty` marks a transparent placeholder for a tile without data
    Written { empty: bool },
    /// Existing file kept (`force = false`)
    Skipped,
    /// Tile without data, left out under `EmptyTilePolicy::Skip`
    EmptySkipped,
    Failed(TileFailure),
    /// Never started because the run was cancelled
    NotAttempted,
}

/// Counts per outcome plus the failure details.
///
/// Tiles without data are counted in `empty`; when a transparent placeholder
/// is written for them they are counted in `written` as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TileRunReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub empty: usize,
    pub not_attempted: usize,
    pub cancelled: bool,
    pub failures: Vec<TileFailure>,
    pub elapsed: Duration,
}

impl TileRunReport {
    pub fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Written { empty } => {
                self.written += 1;
                if empty {
                    self.empty += 1;
                }
            }
            TileOutcome::Skipped => self.skipped += 1,
            TileOutcome::EmptySkipped => self.empty += 1,
            TileOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
            TileOutcome::NotAttempted => self.not_attempted += 1,
        }
    }

    /// Fold another report (e.g. one zoom level) into this one.
    pub fn merge(&mut self, other: TileRunReport) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.empty += other.empty;
        self.not_attempted += other.not_attempted;
        self.cancelled |= other.cancelled;
        self.failures.extend(other.failures);
    }

    /// Whether every tile was handled without failure or cancellation.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.not_attempted == 0
    }

    /// Pretty-printed JSON for logs and the command line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FailureKind) -> TileFailure {
        TileFailure {
            coord: TileCoord::new(1, 0, 1),
            kind,
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn test_record_counts() {
        let mut report = TileRunReport::default();
        report.record(TileOutcome::Written { empty: false });
        report.record(TileOutcome::Written { empty: true });
        report.record(TileOutcome::Skipped);
        report.record(TileOutcome::EmptySkipped);
        report.record(TileOutcome::Failed(failure(FailureKind::Panic)));
        report.record(TileOutcome::NotAttempted);

        assert_eq!(report.written, 2);
        assert_eq!(report.empty, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_attempted, 1);
        assert_eq!(report.failures[0].kind, FailureKind::Panic);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_merge() {
        let mut a = TileRunReport {
            written: 3,
            ..Default::default()
        };
        let b = TileRunReport {
            written: 2,
            failed: 1,
            cancelled: true,
            failures: vec![failure(FailureKind::Write)],
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.written, 5);
        assert_eq!(a.failed, 1);
        assert!(a.cancelled);
        assert_eq!(a.failures.len(), 1);
    }

    #[test]
    fn test_failure_kind_from_error() {
        let coord = TileCoord::new(2, 1, 1);
        let write = TileError::Write {
            coord,
            reason: "disk full".to_string(),
        };
        let render = TileError::TileRender {
            coord,
            reason: "bad ring".to_string(),
        };
        assert_eq!(TileFailure::from_error(coord, &write).kind, FailureKind::Write);
        let f = TileFailure::from_error(coord, &render);
        assert_eq!(f.kind, FailureKind::Render);
        assert_eq!(f.reason, "bad ring");
    }

    #[test]
    fn test_serializes_to_json() {
        let report = TileRunReport {
            written: 1,
            failures: vec![failure(FailureKind::Render)],
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["written"], 1);
        assert_eq!(json["failures"][0]["kind"], "render");
        assert_eq!(json["failures"][0]["coord"]["z"], 1);
    }
}
