//! `trueno-speedmap` command line
//!
//! Aggregates the training logs, prints the speed-loss summary and optionally
//! writes the heatmap as SVG.
//!
//! Run with: cargo run --release -- --log-dir log --output speedmap.svg

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trueno_speedmap::experiment::CsvLogDirectory;
use trueno_speedmap::{
    ExecutionMode, MetricAggregator, RelativeNormalizer, SpeedLossReport, SpeedmapConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "trueno-speedmap",
    version,
    about = "Relative training speed of neural architectures across datasets"
)]
struct Cli {
    /// JSON configuration (architectures, datasets, calibration); built-in tables if omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of `{dataset}_{experiment}.csv` logs; defaults to `log/` next to the executable
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Write the heatmap to this SVG file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Architecture the speed-loss summary compares against
    #[arg(long)]
    reference: Option<String>,
    /// Compute cells one after another instead of on the thread pool
    #[arg(long)]
    sequential: bool,
    /// Print raw and normalized matrices as JSON
    #[arg(long)]
    json: bool,
}

fn default_log_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the running executable")?;
    let dir = exe.parent().context("executable has no parent directory")?;
    Ok(dir.join("log"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SpeedmapConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SpeedmapConfig::default(),
    };
    if let Some(reference) = cli.reference {
        config = config.with_reference(reference);
    }
    config.validate().context("invalid configuration")?;
    let log_dir = match cli.log_dir.or_else(|| config.log_dir.clone()) {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    info!(log_dir = %log_dir.display(), "reading experiment logs");

    let mode = if cli.sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::default()
    };
    let source = CsvLogDirectory::new(&log_dir);
    let raw = MetricAggregator::new(&config)
        .with_mode(mode)
        .aggregate(&source)
        .context("aggregation failed")?;
    let norm = RelativeNormalizer::new().normalize(&raw);

    if cli.json {
        let document = json!({
            "raw": raw,
            "raw_sentinel": raw.to_sentinel_rows(),
            "normalized": norm,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    }

    if let Some(output) = &cli.output {
        write_heatmap(&norm, output)?;
    }

    let report = SpeedLossReport::from_norm(&norm, &config.reference_architecture)
        .context("cannot compute speed-loss summary")?;
    print!("{report}");

    Ok(())
}

#[cfg(feature = "render")]
fn write_heatmap(norm: &trueno_speedmap::NormMatrix, output: &std::path::Path) -> Result<()> {
    trueno_speedmap::render::HeatmapRenderer::new()
        .render_svg(norm, output)
        .with_context(|| format!("failed to write heatmap {}", output.display()))?;
    info!(output = %output.display(), "heatmap written");
    Ok(())
}

#[cfg(not(feature = "render"))]
fn write_heatmap(_norm: &trueno_speedmap::NormMatrix, _output: &std::path::Path) -> Result<()> {
    anyhow::bail!("heatmap output requires the `render` feature")
}
