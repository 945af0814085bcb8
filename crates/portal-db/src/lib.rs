//! Portal DB Library
//!
//! Persistence for submissions: the repository trait, its PostgreSQL
//! implementation and an in-memory implementation for tests and local runs.

pub mod db;
pub mod memory;

pub use db::{PgSubmissionRepository, SubmissionRepository};
pub use memory::InMemorySubmissionRepository;
