//! Database repositories for data access layer

pub mod submission;

pub use submission::{PgSubmissionRepository, SubmissionRepository};
