//! Offline fit: training CSV in, artifact bundle out

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use data_cleaner::Dataset;
use pipeline::{FitConfig, FitPipeline};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "churn-fit")]
#[command(about = "Fit the churn feature vocabulary and canonical schema", long_about = None)]
struct Cli {
    /// Training CSV with a header row
    #[arg(short, long)]
    input: PathBuf,

    /// Artifact directory (created if missing)
    #[arg(short, long, default_value = "artifacts")]
    output: PathBuf,

    /// Also write the transformed training table here
    #[arg(long)]
    table: Option<PathBuf>,

    /// Label column split off before fitting
    #[arg(long, default_value = "Churn")]
    target: String,

    /// Fit every column, including the label
    #[arg(long)]
    no_target: bool,

    /// Bundle version recorded in the manifest
    #[arg(long)]
    version: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let dataset = Dataset::from_csv_path(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let config = FitConfig {
        target_column: (!cli.no_target).then_some(cli.target),
        ..Default::default()
    };
    let output = FitPipeline::new(config).run(&dataset)?;

    let version = cli
        .version
        .unwrap_or_else(|| Utc::now().format("%Y%m%d%H%M%S").to_string());
    let manifest = output.artifacts.save(&cli.output, &version)?;
    if manifest.model.is_none() {
        info!(
            "No model file in {} yet; add model.onnx or model.json before serving",
            cli.output.display()
        );
    }

    if let Some(path) = &cli.table {
        output.table.write_csv_path(path)?;
        info!("Wrote {} training rows to {}", output.table.len(), path.display());
    }

    Ok(())
}
