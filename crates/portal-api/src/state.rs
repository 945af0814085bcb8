//! Application state shared by all handlers.

use crate::services::intake::IntakeService;
use portal_core::{Config, IdentityHasher};
use portal_infra::RateLimiter;
use std::sync::Arc;

/// Built once in setup and shared through `Arc`. The rate limiter's counters
/// are the only mutable state in here.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityHasher,
    pub rate_limiter: Arc<RateLimiter>,
    pub intake: IntakeService,
}

impl AppState {
    pub fn supports_locale(&self, locale: &str) -> bool {
        self.config.supported_locales.iter().any(|l| l == locale)
    }
}
