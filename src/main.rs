mod bucket;
mod calendar;
mod collection;
mod config;
mod consolidate;
mod difference;
mod display;
mod error;
mod export;
mod load;
mod models;
mod pipeline;
mod promote;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use config::PipelineConfig;

/// Dream/news similarity buckets - builds bar, column and bubble chart data
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory of per-day comparison JSON files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Path to a TOML config file (overrides DREAM_BUCKETS_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> Result<PipelineConfig> {
    // CLI arg > environment > compiled-in defaults
    let path = match &args.config {
        Some(p) => {
            debug!("Using config file from --config argument: {}", p.display());
            Some(p.clone())
        }
        None => std::env::var("DREAM_BUCKETS_CONFIG").ok().map(|p| {
            debug!("Using config file from environment: {}", p);
            PathBuf::from(p)
        }),
    };

    match path {
        Some(p) => PipelineConfig::load_from_file(&p),
        None => {
            debug!("No config file given, using built-in defaults");
            let config = PipelineConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting dream_news_buckets");

    let args = Args::parse();
    let config = resolve_config(&args)?;

    info!(
        "Configuration - collections={}, granularities={:?}, cutoffs=({}, {})",
        config.collections.len(),
        config.granularities,
        config.thresholds.medium,
        config.thresholds.high
    );

    pipeline::run(&config, &args.input_dir, &args.output_dir)
}
