use std::sync::Arc;

use axum::Router;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::error::AppError;

/// Per-client request budget: `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl RateLimit {
    /// Interval at which one request of budget is given back.
    fn replenish_interval_ms(&self) -> u64 {
        let max = u64::from(self.max_requests.max(1));
        (self.window_secs.saturating_mul(1_000) / max).max(1)
    }
}

/// Wraps `router` in a per-IP limiter. The client address comes from
/// `X-Forwarded-For`, `X-Real-IP` or `Forwarded` first, then the peer socket.
///
/// Responses carry `x-ratelimit-limit` and `x-ratelimit-remaining`; a client
/// over budget gets 429 with `retry-after`.
pub fn rate_limited(router: Router, limits: RateLimit) -> Result<Router, AppError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_millisecond(limits.replenish_interval_ms())
        .burst_size(limits.max_requests.max(1))
        .use_headers()
        .finish()
        .ok_or_else(|| AppError::Internal("invalid rate limit settings".to_string()))?;

    Ok(router.layer(GovernorLayer {
        config: Arc::new(config),
    }))
}
