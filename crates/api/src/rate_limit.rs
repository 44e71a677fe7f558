//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP limits on the prediction endpoints via tower_governor. The GCRA
//! state lives in the limiter itself, so no background task is needed.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::error::ServiceError;

/// Governor config keyed by peer IP, with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request of quota
    pub per_second: u64,
    /// Requests that can be made back to back before limiting starts
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Tighter limits for the admin endpoints
    pub fn strict() -> Self {
        Self {
            per_second: 10,
            burst_size: 2,
        }
    }
}

/// Build the governor config for a `GovernorLayer`.
///
/// Peer IPs are read from connect info, so the service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<DefaultGovernorConfig>, ServiceError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or_else(|| ServiceError::InvalidRateLimit(config.clone()))
}
