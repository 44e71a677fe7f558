//! Churn Prediction Service - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;
    init_logging(config.json_logs)?;

    info!("=== Churn Prediction Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Serving artifacts from {}", config.artifact_dir.display());

    run_server(config).await?;

    Ok(())
}
