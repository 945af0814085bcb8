//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Writes are all-or-nothing: after `put` returns `Ok` the object under `key`
/// is complete, and after it returns `Err` nothing is addressable under `key`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key` and return its public URL.
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str)
        -> StorageResult<String>;

    /// Public URL under which `storage_key` is served.
    fn public_url(&self, storage_key: &str) -> String;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
