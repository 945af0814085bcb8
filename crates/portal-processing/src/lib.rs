//! Portal Processing Library
//!
//! Attachment validation and storage, plus the lightweight spam heuristics
//! applied to submission text.

pub mod allowlist;
pub mod attachment;
pub mod sniff;
pub mod spam;
pub mod validator;

pub use attachment::AttachmentStore;
pub use sniff::{ContentSniffer, MagicSniffer, MimeGuess};
pub use spam::{SpamAssessment, SpamAssessor, SpamReason, SpamRules};
pub use self::validator::{FileValidationError, FileValidator, IncomingFile, ValidatedFile};
