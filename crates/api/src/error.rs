//! Service and Handler Errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeline::{ErrorKind, PipelineError};
use serde::Serialize;
use thiserror::Error;

use crate::rate_limit::RateLimitConfig;

/// Startup failures
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("artifacts: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("invalid rate limit {0:?}: quota and period must be non-zero")]
    InvalidRateLimit(RateLimitConfig),

    #[error("invalid CORS origin {0:?}")]
    InvalidOrigin(String),

    #[error("metrics recorder: {0}")]
    Metrics(String),

    #[error("logging already initialised: {0}")]
    Logging(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Request failures rendered as JSON error bodies
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(e) => match e.kind() {
                ErrorKind::MalformedInput => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::ArtifactLoadFailure => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Pipeline(e) => e.kind().as_str(),
            ApiError::Body(_) => ErrorKind::MalformedInput.as_str(),
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{} ({})", self, self.kind());
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            stage: match &self {
                ApiError::Pipeline(e) => Some(e.stage().to_string()),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
