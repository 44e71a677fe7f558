//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `churn.toml`, then `CHURN__*` environment variables
//! (`CHURN__RATE_LIMIT__BURST_SIZE=50`, `CHURN__ALLOWED_ORIGINS=a,b`).

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rate_limit::RateLimitConfig;

const ENV_PREFIX: &str = "CHURN";
const CONFIG_NAME: &str = "churn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Directory holding manifest, vocabulary, schema and model
    pub artifact_dir: PathBuf,
    /// CORS origins; `*` allows any
    pub allowed_origins: Vec<String>,
    /// Limits for `/predict` and the read-only routes
    pub rate_limit: RateLimitConfig,
    /// Limits for `/api/v1/admin/*`
    pub admin_rate_limit: RateLimitConfig,
    /// Emit logs as JSON lines instead of text
    pub json_logs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            artifact_dir: PathBuf::from("artifacts"),
            allowed_origins: vec!["*".to_string()],
            rate_limit: RateLimitConfig::default(),
            admin_rate_limit: RateLimitConfig::strict(),
            json_logs: false,
        }
    }
}

impl ServiceConfig {
    /// Load from `churn.toml` in the working directory and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(CONFIG_NAME).required(false))
    }

    /// Load from an explicit file and the environment
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(Config::try_from(&ServiceConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
