use super::{RateLimitBackend, RateLimitDecision, RateLimitError, RateLimitPolicy};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-window counter for one key
#[derive(Debug, Clone)]
struct RateLimitBucket {
    count: u32,
    expires_at: Instant,
}

/// In-process fixed-window rate limiter.
///
/// Buckets are created on first hit and replaced once expired; they are never
/// evicted, so memory grows with the number of distinct keys seen.
#[derive(Clone, Default)]
pub struct InMemoryRateLimiter {
    buckets: Arc<Mutex<HashMap<String, RateLimitBucket>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let now = Instant::now();
        let limit = policy.max_requests;
        let mut buckets = self.buckets.lock().await;

        match buckets.get_mut(key) {
            Some(bucket) if bucket.expires_at > now => {
                let reset_after = bucket.expires_at.saturating_duration_since(now);
                if bucket.count >= limit {
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        limit,
                        reset_after,
                    }
                } else {
                    bucket.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: limit.saturating_sub(bucket.count),
                        limit,
                        reset_after,
                    }
                }
            }
            _ => {
                buckets.insert(
                    key.to_string(),
                    RateLimitBucket {
                        count: 1,
                        expires_at: now + policy.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: limit.saturating_sub(1),
                    limit,
                    reset_after: policy.window,
                }
            }
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

#[async_trait]
impl RateLimitBackend for InMemoryRateLimiter {
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        Ok(self.check(key, policy).await)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
