//! Admin Routes

use axum::{extract::State, Json};
use pipeline::ServingContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub previous_version: String,
    pub version: String,
    pub feature_count: usize,
}

/// Reload the artifact bundle and swap it in.
///
/// The new bundle is fully loaded and validated before the swap; on failure
/// the active context keeps serving.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let dir = state.artifact_dir.clone();
    info!("Reloading artifacts from {}", dir.display());

    let loaded = tokio::task::spawn_blocking(move || ServingContext::load(&dir))
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {}", e)))?;

    let context = match loaded {
        Ok(context) => context,
        Err(e) => {
            warn!("Reload rejected, keeping {}: {}", state.context.current().version(), e);
            return Err(e.into());
        }
    };

    let version = context.version().to_string();
    let feature_count = context.schema().len();
    let previous = state.context.replace(context);

    Ok(Json(ReloadResponse {
        previous_version: previous.version().to_string(),
        version,
        feature_count,
    }))
}
