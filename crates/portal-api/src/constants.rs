//! API constants
//!
//! Route paths, form field names and fixed limits used by the HTTP layer.

/// Submission endpoint served under the default locale.
pub const SUBMIT_PATH: &str = "/api/submit";

/// Submission endpoint with an explicit locale prefix, e.g. `/ne/api/submit`.
pub const LOCALIZED_SUBMIT_PATH: &str = "/{locale}/api/submit";

pub const HEALTH_PATH: &str = "/health";

pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Multipart part that carries the optional attachment.
pub const ATTACHMENT_FIELD: &str = "attachment";

/// Room for form fields and multipart framing on top of the attachment limit.
pub const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Prefix of the per-client rate limit key. The client part is always a digest.
pub const RATE_LIMIT_KEY_PREFIX: &str = "submit:ip:";

pub const RATE_LIMIT_LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";

/// Default server-level concurrency limit when `HTTP_CONCURRENCY_LIMIT` is unset.
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;
