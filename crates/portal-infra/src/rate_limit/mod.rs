//! Rate limiting for the submission endpoint
//!
//! Fixed-window counters in process memory, or a sliding window shared by
//! every instance through Redis. [`RateLimiter`] combines the two: the durable
//! backend answers when it can, the in-process map answers when it cannot.

mod limiter;
mod memory;
#[cfg(feature = "rate-limit-redis")]
mod redis_window;

pub use limiter::RateLimiter;
pub use memory::InMemoryRateLimiter;
#[cfg(feature = "rate-limit-redis")]
pub use redis_window::{RedisConfig, RedisSlidingWindow};

use async_trait::async_trait;
use portal_core::RateLimitSettings;
use std::time::Duration;

/// At most `max_requests` per key in any `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }
}

impl From<&RateLimitSettings> for RateLimitPolicy {
    fn from(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_requests,
            Duration::from_secs(settings.window_seconds),
        )
    }
}

/// Outcome of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    /// Time until the key can be used again (or the window resets).
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Whole seconds for a `Retry-After` header, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit backend connection failed: {0}")]
    Connection(String),

    #[error("Rate limit backend error: {0}")]
    Backend(String),

    #[error("Rate limit backend timed out after {0:?}")]
    Timeout(Duration),
}

/// A store that can count hits against a policy.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Record one hit for `key` and report whether it is within `policy`.
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            limit: 10,
            reset_after: Duration::from_millis(1500),
        };
        assert_eq!(decision.retry_after_secs(), 2);

        let decision = RateLimitDecision {
            reset_after: Duration::ZERO,
            ..decision
        };
        assert_eq!(decision.retry_after_secs(), 1);
    }

    #[test]
    fn test_policy_from_settings() {
        let settings = RateLimitSettings {
            window_seconds: 30,
            max_requests: 3,
            ..RateLimitSettings::default()
        };
        assert_eq!(
            RateLimitPolicy::from(&settings),
            RateLimitPolicy::new(3, Duration::from_secs(30))
        );
    }
}
