//! Submission intake: request parsing, the processing pipeline and its audit trail.

pub mod audit;
pub mod parse;
mod pipeline;

pub use parse::{parse_submission, ParsedSubmission, RequestBody};
pub use pipeline::IntakeService;

/// Per-request facts resolved before the body is read.
#[derive(Debug, Clone)]
pub struct IntakeContext {
    /// Keyed digest of the client address. The raw address is never kept.
    pub ip_digest: String,
    pub locale: String,
}
