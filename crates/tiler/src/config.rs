//! Engine configuration.
//!
//! Defaults suit a one-off run on a workstation. Every field can be
//! overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SEATILE_WORKERS` | `workers` |
//! | `SEATILE_FORCE` | `force` |
//! | `SEATILE_EMPTY_TILES` | `empty_tiles` (`write` or `skip`) |
//! | `SEATILE_MAX_RUNTIME_SECS` | `max_runtime` |
//! | `SEATILE_STRATEGY` | `strategy` (`contour` or `sampled`) |
//! | `SEATILE_PNG_ENCODING` | `png_encoding` (`rgba` or `indexed`) |
//! | `SEATILE_MAX_TRIANGLE_RATIO` | `max_triangle_ratio` (`none` disables) |
//! | `SEATILE_BUFFER_PIXELS` | `buffer.buffer_pixels` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use mesh::DEFAULT_MAX_TRIANGLE_RATIO;
use renderer::{PngEncoding, RenderStrategy};
use tile_common::tile::TileBufferConfig;
use tile_common::{TileError, TileResult};

/// What to do with tiles that no triangle reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTilePolicy {
    /// Write a fully transparent placeholder
    #[default]
    WriteTransparent,
    /// Leave no file behind
    Skip,
}

impl FromStr for EmptyTilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "write" | "write_transparent" | "transparent" => Ok(EmptyTilePolicy::WriteTransparent),
            "skip" => Ok(EmptyTilePolicy::Skip),
            other => Err(format!("unknown empty tile policy '{}'", other)),
        }
    }
}

/// Settings for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the worker pool
    pub workers: usize,
    /// Re-render tiles that already exist on disk
    pub force: bool,
    pub empty_tiles: EmptyTilePolicy,
    /// Stop starting new tiles after this long
    pub max_runtime: Option<Duration>,
    pub strategy: RenderStrategy,
    pub buffer: TileBufferConfig,
    /// Gap masking threshold, see [`mesh::MeshOptions`]
    pub max_triangle_ratio: Option<f64>,
    pub png_encoding: PngEncoding,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            force: false,
            empty_tiles: EmptyTilePolicy::default(),
            max_runtime: None,
            strategy: RenderStrategy::default(),
            buffer: TileBufferConfig::default(),
            max_triangle_ratio: Some(DEFAULT_MAX_TRIANGLE_RATIO),
            png_encoding: PngEncoding::default(),
        }
    }
}

/// Available cores minus one, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

impl EngineConfig {
    /// Defaults overridden by `SEATILE_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(workers) = env_parse::<usize>("SEATILE_WORKERS") {
            config.workers = workers;
        }
        if let Some(force) = env_parse::<bool>("SEATILE_FORCE") {
            config.force = force;
        }
        if let Some(policy) = env_parse::<EmptyTilePolicy>("SEATILE_EMPTY_TILES") {
            config.empty_tiles = policy;
        }
        if let Some(secs) = env_parse::<u64>("SEATILE_MAX_RUNTIME_SECS") {
            config.max_runtime = Some(Duration::from_secs(secs));
        }
        if let Some(strategy) = env_parse::<RenderStrategy>("SEATILE_STRATEGY") {
            config.strategy = strategy;
        }
        if let Some(encoding) = env_parse::<PngEncoding>("SEATILE_PNG_ENCODING") {
            config.png_encoding = encoding;
        }
        if let Ok(raw) = env::var("SEATILE_MAX_TRIANGLE_RATIO") {
            match parse_ratio(&raw) {
                Ok(ratio) => config.max_triangle_ratio = ratio,
                Err(e) => warn!(var = "SEATILE_MAX_TRIANGLE_RATIO", value = %raw, error = %e, "Ignoring invalid value"),
            }
        }
        config.buffer = TileBufferConfig::from_env();

        config
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> TileResult<()> {
        if self.workers == 0 {
            return Err(TileError::InvalidInput("worker count must be at least 1".to_string()));
        }
        if let Some(ratio) = self.max_triangle_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(TileError::InvalidInput(format!(
                    "max_triangle_ratio must be positive, got {}",
                    ratio
                )));
            }
        }
        Ok(())
    }
}

/// `none`, `off` and `0` disable masking.
pub fn parse_ratio(raw: &str) -> Result<Option<f64>, String> {
    match raw.trim().to_lowercase().as_str() {
        "none" | "off" | "0" => Ok(None),
        other => other
            .parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid ratio '{}': {}", other, e)),
    }
}

fn env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(var = name, value = %raw, error = %e, "Ignoring invalid value");
            None
        }
    }
}
