//! Shared key generation for storage backends.
//!
//! Key format: `{yyyymmddHHMMSSfff}-{uuid v4, simple}.{ext}`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a collision-resistant storage key with the given extension.
///
/// `extension` must already be validated (lowercase, alphanumeric); it is the
/// only client-influenced part of the key.
pub fn generate_storage_key(extension: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        now.format("%Y%m%d%H%M%S%3f"),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Whether `key` is a flat, safe object name.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
