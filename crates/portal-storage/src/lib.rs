//! Portal Storage Library
//!
//! Storage abstraction for submission attachments and its local filesystem
//! backend.
//!
//! # Storage key format
//!
//! Keys are flat and generated server side: `{yyyymmddHHMMSSfff}-{uuid}.{ext}`.
//! The client's filename never becomes part of a key. Key generation lives in
//! the `keys` module so every backend agrees on it.

pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::generate_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
