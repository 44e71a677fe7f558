//! Churn Prediction API Server
//!
//! HTTP front end over the serving pipeline. Artifacts are loaded once at
//! startup and can be swapped at runtime through the admin reload route.

use axum::{
    extract::State,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pipeline::{ContextHandle, RenameTable, ServingContext};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::ServiceConfig;
pub use error::{ApiError, ServiceError};
pub use routes::predict::{CustomerData, PredictionResponse, YesNo, FIELDS};

use rate_limit::create_governor_config;

/// Application state shared across handlers
pub struct AppState {
    /// Active serving context, swapped whole on reload
    pub context: ContextHandle,
    /// Where reloads read the bundle from
    pub artifact_dir: PathBuf,
    pub metrics: PrometheusHandle,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(context: ServingContext, artifact_dir: PathBuf, metrics: PrometheusHandle) -> Self {
        Self {
            context: ContextHandle::new(context),
            artifact_dir,
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Create the application router without middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    public_routes().merge(admin_routes()).with_state(state)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/api/v1/health", get(routes::health::health))
        .route("/predict", post(routes::predict::predict))
        .route("/metrics", get(metrics_handler))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/admin/reload", post(routes::admin::reload))
}

/// Router with CORS, rate limiting and request tracing.
///
/// Admin routes sit behind their own, tighter limiter.
pub fn app(state: Arc<AppState>, config: &ServiceConfig) -> Result<Router, ServiceError> {
    let public = public_routes().layer(GovernorLayer {
        config: create_governor_config(&config.rate_limit)?,
    });
    let admin = admin_routes().layer(GovernorLayer {
        config: create_governor_config(&config.admin_rate_limit)?,
    });

    Ok(public
        .merge(admin)
        .with_state(state)
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(config: &ServiceConfig) -> Result<CorsLayer, ServiceError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| ServiceError::InvalidOrigin(o.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ServiceError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServiceError::Metrics(e.to_string()))?;

    metrics::describe_counter!("churn_predictions_total", "Predictions served, by label");
    metrics::describe_counter!(
        "churn_prediction_errors_total",
        "Rejected or failed prediction requests, by error kind"
    );
    Ok(handle)
}

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| ServiceError::Logging(e.to_string()))
}

/// Load artifacts and serve until the listener fails
pub async fn run_server(config: ServiceConfig) -> Result<(), ServiceError> {
    RenameTable::customer().check_complete(&FIELDS)?;

    let context = ServingContext::load(&config.artifact_dir)?;
    let metrics = install_metrics()?;
    let state = Arc::new(AppState::new(context, config.artifact_dir.clone(), metrics));
    let app = app(state, &config)?;

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use data_cleaner::Dataset;
    use inference_engine::LinearModel;
    use pipeline::{FitPipeline, LINEAR_MODEL_FILE, SCHEMA_FILE};
    use crate::rate_limit::RateLimitConfig;
    use serde_json::{json, Value as Json};
    use std::path::Path;
    use tower::ServiceExt;

    const TELCO: &str = include_str!("../../pipeline/testdata/telco_sample.csv");

    fn write_bundle(dir: &Path, version: &str) {
        let dataset = Dataset::from_csv_reader(TELCO.as_bytes()).unwrap();
        let output = FitPipeline::default().run(&dataset).unwrap();
        LinearModel::new(vec![0.01; output.artifacts.schema.len()], -0.5)
            .save(&dir.join(LINEAR_MODEL_FILE))
            .unwrap();
        output.artifacts.save(dir, version).unwrap();
    }

    fn state(dir: &Path) -> Arc<AppState> {
        write_bundle(dir, "v1");
        let context = ServingContext::load(dir).unwrap();
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        Arc::new(AppState::new(context, dir.to_path_buf(), metrics))
    }

    fn customer() -> Json {
        json!({
            "gender": "Male",
            "seniorCitizen": 0,
            "partner": "Yes",
            "dependents": "No",
            "tenure": 12,
            "phoneService": "Yes",
            "multipleLines": "No",
            "internetService": "Fiber optic",
            "onlineSecurity": "No",
            "onlineBackup": "Yes",
            "deviceProtection": "No",
            "techSupport": "No",
            "streamingTV": "Yes",
            "streamingMovies": "No",
            "contract": "Month-to-month",
            "paperlessBilling": "Yes",
            "paymentMethod": "Electronic check",
            "monthlyCharges": 70.35,
            "totalCharges": 844.2
        })
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
        (status, json)
    }

    async fn send_from(router: Router, method: &str, uri: &str, peer: SocketAddr) -> StatusCode {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_root_welcome() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(create_router(state(dir.path())), "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Welcome"));
    }

    #[tokio::test]
    async fn test_health_reports_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            send(create_router(state(dir.path())), "GET", "/api/v1/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["bundle_version"], "v1");
        assert_eq!(body["feature_count"], 40);
        assert_eq!(body["model"], "linear");
    }

    #[tokio::test]
    async fn test_predict_returns_label() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            create_router(state(dir.path())),
            "POST",
            "/predict",
            Some(customer()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let label = body["churn_prediction"].as_i64().unwrap();
        assert!(label == 0 || label == 1);
        assert!(body["probability"].is_number());
    }

    #[tokio::test]
    async fn test_predict_blank_total_charges_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = customer();
        body["totalCharges"] = json!(" ");

        let (status, body) =
            send(create_router(state(dir.path())), "POST", "/predict", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "malformed_input");
        assert_eq!(body["stage"], "clean");
    }

    #[tokio::test]
    async fn test_predict_missing_field_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = customer();
        body.as_object_mut().unwrap().remove("contract");

        let (status, body) =
            send(create_router(state(dir.path())), "POST", "/predict", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "malformed_input");
    }

    #[tokio::test]
    async fn test_predict_unknown_category_still_served() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = customer();
        body["paymentMethod"] = json!("Crypto wallet");

        let (status, _) =
            send(create_router(state(dir.path())), "POST", "/predict", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_active_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(state(dir.path()));
        std::fs::write(dir.path().join(SCHEMA_FILE), "not json").unwrap();

        let (status, body) = send(router.clone(), "POST", "/api/v1/admin/reload", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "artifact_load_failure");

        let (_, health) = send(router.clone(), "GET", "/api/v1/health", None).await;
        assert_eq!(health["bundle_version"], "v1");

        let (status, _) = send(router, "POST", "/predict", Some(customer())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reload_swaps_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(state(dir.path()));
        write_bundle(dir.path(), "v2");

        let (status, body) = send(router.clone(), "POST", "/api/v1/admin/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previous_version"], "v1");
        assert_eq!(body["version"], "v2");

        let (_, health) = send(router, "GET", "/api/v1/health", None).await;
        assert_eq!(health["bundle_version"], "v2");
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        let config = ServiceConfig {
            allowed_origins: vec!["bad\norigin".into()],
            ..Default::default()
        };
        assert!(matches!(cors_layer(&config), Err(ServiceError::InvalidOrigin(_))));
    }

    #[tokio::test]
    async fn test_admin_routes_have_their_own_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            admin_rate_limit: RateLimitConfig {
                per_second: 60,
                burst_size: 1,
            },
            ..Default::default()
        };
        let router = app(state(dir.path()), &config).unwrap();
        let peer: SocketAddr = "10.0.0.7:40000".parse().unwrap();

        let first = send_from(router.clone(), "POST", "/api/v1/admin/reload", peer).await;
        assert_eq!(first, StatusCode::OK);
        let second = send_from(router.clone(), "POST", "/api/v1/admin/reload", peer).await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);

        // The public limiter still has quota for the same peer
        let health = send_from(router, "GET", "/api/v1/health", peer).await;
        assert_eq!(health, StatusCode::OK);
    }

    #[test]
    fn test_app_builds_with_layers() {
        let dir = tempfile::tempdir().unwrap();
        assert!(app(state(dir.path()), &ServiceConfig::default()).is_ok());
    }
}
