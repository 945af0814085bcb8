use super::{InMemoryRateLimiter, RateLimitBackend, RateLimitDecision, RateLimitPolicy};
use std::sync::Arc;

/// Rate limiter used by request handlers.
///
/// When a durable backend is configured it is consulted first; any error from
/// it is logged and that call is answered by the in-process limiter instead.
/// A limiter built with `bypass` allows everything.
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    durable: Option<Arc<dyn RateLimitBackend>>,
    fallback: InMemoryRateLimiter,
    bypass: bool,
}

impl RateLimiter {
    /// In-process limiting only.
    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            durable: None,
            fallback: InMemoryRateLimiter::new(),
            bypass: false,
        }
    }

    /// Durable backend with in-process fallback.
    pub fn with_backend(policy: RateLimitPolicy, backend: Arc<dyn RateLimitBackend>) -> Self {
        Self {
            durable: Some(backend),
            ..Self::in_memory(policy)
        }
    }

    /// Allow every request. Only meant for non-production environments.
    pub fn bypassed(policy: RateLimitPolicy) -> Self {
        Self {
            bypass: true,
            ..Self::in_memory(policy)
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Name of the backend that answers in the normal case.
    pub fn backend_name(&self) -> &'static str {
        if self.bypass {
            return "disabled";
        }
        match &self.durable {
            Some(backend) => backend.name(),
            None => self.fallback.name(),
        }
    }

    #[tracing::instrument(skip(self), fields(backend = self.backend_name()))]
    pub async fn allow(&self, key: &str) -> RateLimitDecision {
        if self.bypass {
            return RateLimitDecision {
                allowed: true,
                remaining: self.policy.max_requests,
                limit: self.policy.max_requests,
                reset_after: self.policy.window,
            };
        }

        if let Some(backend) = &self.durable {
            match backend.hit(key, &self.policy).await {
                Ok(decision) => return decision,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backend = backend.name(),
                        "Durable rate limit backend failed, using in-process limiter"
                    );
                }
            }
        }

        self.fallback.check(key, &self.policy).await
    }
}
