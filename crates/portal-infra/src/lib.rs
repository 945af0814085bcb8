//! Portal Infrastructure Library
//!
//! Shared infrastructure for the intake service:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization
//! - Rate limiting (in-process and Redis sliding window)

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateLimitDecision, RateLimitPolicy, RateLimiter};
