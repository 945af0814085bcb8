//! Service initialization and application state setup

use crate::services::intake::IntakeService;
use crate::state::AppState;
use anyhow::{Context, Result};
use portal_core::{Config, IdentityHasher};
use portal_db::SubmissionRepository;
use portal_infra::rate_limit::{RedisConfig, RedisSlidingWindow};
use portal_infra::{RateLimitPolicy, RateLimiter};
use portal_processing::{AttachmentStore, FileValidator, SpamAssessor, SpamRules};
use portal_storage::Storage;
use std::sync::Arc;
use std::time::Duration;

/// Wire every pipeline component into the shared state.
///
/// Persistence and storage are passed in so tests can substitute in-memory
/// and temp-dir backends.
pub fn initialize_services(
    config: &Config,
    repository: Arc<dyn SubmissionRepository>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let identity = setup_identity(config);
    let rate_limiter = Arc::new(setup_rate_limiter(config)?);

    let spam = SpamAssessor::new(SpamRules {
        near_limit_length: config.spam_near_limit_length,
        ..SpamRules::default()
    });

    let intake = IntakeService::new(
        FileValidator::new(config.upload.max_upload_bytes),
        AttachmentStore::new(storage),
        spam,
        repository,
        config.spam_flag_threshold,
    );

    tracing::info!(
        rate_limit_backend = rate_limiter.backend_name(),
        max_requests = config.rate_limit.max_requests,
        window_seconds = config.rate_limit.window_seconds,
        spam_flag_threshold = config.spam_flag_threshold,
        "Intake services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        identity,
        rate_limiter,
        intake,
    }))
}

fn setup_identity(config: &Config) -> IdentityHasher {
    if config.insecure_salt {
        tracing::warn!(
            environment = %config.environment,
            "IP_HASH_SALT is not set; client digests use the built-in development salt and are not private"
        );
    }
    IdentityHasher::new(config.ip_hash_salt.as_bytes())
}

fn setup_rate_limiter(config: &Config) -> Result<RateLimiter> {
    let policy = RateLimitPolicy::from(&config.rate_limit);

    if config.rate_limit_bypassed() {
        tracing::warn!(
            environment = %config.environment,
            "RATE_LIMIT_DISABLED is set: submissions are NOT rate limited"
        );
        return Ok(RateLimiter::bypassed(policy));
    }
    if config.rate_limit.disabled_requested {
        tracing::warn!("RATE_LIMIT_DISABLED is ignored in production");
    }

    let Some(url) = &config.rate_limit.redis_url else {
        tracing::info!("Using in-process rate limiter; limits are per instance");
        return Ok(RateLimiter::in_memory(policy));
    };

    let backend = RedisSlidingWindow::new(&RedisConfig {
        url: url.clone(),
        prefix: config.rate_limit.redis_key_prefix.clone(),
        pool_size: config.rate_limit.redis_pool_size,
        timeout: Duration::from_millis(config.rate_limit.redis_timeout_ms),
    })
    .context("Failed to configure Redis rate limit backend")?;

    tracing::info!(
        prefix = %config.rate_limit.redis_key_prefix,
        pool_size = config.rate_limit.redis_pool_size,
        "Using Redis rate limiter with in-process fallback"
    );
    Ok(RateLimiter::with_backend(policy, Arc::new(backend)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::RateLimitSettings;

    #[test]
    fn test_bypass_only_outside_production() {
        let mut config = Config {
            rate_limit: RateLimitSettings {
                disabled_requested: true,
                ..RateLimitSettings::default()
            },
            ..Config::default()
        };
        assert!(setup_rate_limiter(&config).unwrap().is_bypassed());

        config.environment = "production".to_string();
        let limiter = setup_rate_limiter(&config).unwrap();
        assert!(!limiter.is_bypassed());
        assert_eq!(limiter.backend_name(), "memory");
    }

    #[test]
    fn test_redis_url_selects_redis_backend() {
        let config = Config {
            rate_limit: RateLimitSettings {
                redis_url: Some("redis://127.0.0.1:6379".to_string()),
                ..RateLimitSettings::default()
            },
            ..Config::default()
        };
        assert_eq!(setup_rate_limiter(&config).unwrap().backend_name(), "redis");
    }
}
