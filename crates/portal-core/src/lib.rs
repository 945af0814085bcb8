//! Portal Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! caller identity hasher shared by every component of the submission intake
//! pipeline.

pub mod config;
pub mod error;
pub mod identity;
pub mod models;

// Re-export commonly used types
pub use config::{Config, RateLimitSettings, UploadSettings};
pub use error::{AppError, ErrorMetadata, FieldIssue, LogLevel};
pub use identity::IdentityHasher;
pub use models::{
    NewSubmission, StoredFileInfo, Submission, SubmissionFields, SubmissionResponse,
    SubmissionStatus,
};
