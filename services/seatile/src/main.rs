//! seatile: render a scalar field into an XYZ PNG tile pyramid.
//!
//! Loads a field JSON file and a style (preset or JSON file), runs the tile
//! engine on a worker pool and prints the run report as JSON. Ctrl-C stops
//! new tiles from starting; tiles already in progress are finished.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use renderer::{PngEncoding, RenderStrategy};
use seatile::{load_style, parse_zoom_levels, resolve_bounds, FieldFile};
use tiler::{CancellationToken, EmptyTilePolicy, EngineConfig, TileEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "seatile")]
#[command(about = "Generate Web-Mercator PNG tiles from a geophysical scalar field")]
struct Args {
    /// Field JSON file with latitudes, longitudes and values
    #[arg(short, long, env = "SEATILE_FIELD")]
    field: PathBuf,

    /// Output directory of the tile pyramid
    #[arg(short, long, env = "SEATILE_OUTPUT_DIR")]
    output: PathBuf,

    /// Zoom levels, e.g. "0-5" or "2,4,6"
    #[arg(short, long, env = "SEATILE_ZOOMS", default_value = "0-4")]
    zooms: String,

    /// Style preset (ssh, sst, chlorophyll, bathymetry) or style JSON file
    #[arg(short, long, env = "SEATILE_STYLE", default_value = "sst")]
    style: String,

    /// Bounds as min_lon,min_lat,max_lon,max_lat (default: field extent)
    #[arg(long, env = "SEATILE_BBOX")]
    bbox: Option<String>,

    /// Worker threads (default: cores - 1)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Re-render tiles that already exist
    #[arg(long)]
    force: bool,

    /// Rendering strategy: contour or sampled
    #[arg(long)]
    strategy: Option<RenderStrategy>,

    /// PNG color type: rgba or indexed
    #[arg(long)]
    png_encoding: Option<PngEncoding>,

    /// What to do with tiles without data: write or skip
    #[arg(long)]
    empty_tiles: Option<EmptyTilePolicy>,

    /// Stop starting new tiles after this many seconds
    #[arg(long)]
    max_runtime_secs: Option<u64>,

    /// Log level
    #[arg(long, env = "SEATILE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "SEATILE_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

impl Args {
    /// Environment-derived engine settings with command-line overrides applied.
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::from_env();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.force {
            config.force = true;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(encoding) = self.png_encoding {
            config.png_encoding = encoding;
        }
        if let Some(policy) = self.empty_tiles {
            config.empty_tiles = policy;
        }
        if let Some(secs) = self.max_runtime_secs {
            config.max_runtime = Some(Duration::from_secs(secs));
        }
        config
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match args.log_format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder().with_env_filter(filter).json().finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = args.engine_config();
    let zooms = parse_zoom_levels(&args.zooms)?;
    let style = load_style(&args.style)?;
    let field_file = FieldFile::from_path(&args.field)?;
    let bounds = resolve_bounds(args.bbox.as_deref(), &field_file)?;
    let field = field_file.into_field()?;

    info!(
        field = %args.field.display(),
        output = %args.output.display(),
        zooms = ?zooms,
        style = %args.style,
        bounds = ?bounds,
        "Starting seatile"
    );

    let token = CancellationToken::new();
    let engine = TileEngine::new(config).with_cancellation(token.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing tiles in progress");
            token.cancel();
        }
    });

    let output = args.output.clone();
    let report = tokio::task::spawn_blocking(move || engine.run(&bounds, &field, &output, &zooms, &style))
        .await
        .context("Tile generation task failed")??;

    println!("{}", report.to_json()?);

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            failed = report.failed,
            not_attempted = report.not_attempted,
            cancelled = report.cancelled,
            "Run finished incomplete"
        );
        Ok(ExitCode::FAILURE)
    }
}
