//! Data models for the submission intake pipeline

mod submission;

pub use submission::*;
