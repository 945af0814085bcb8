use crate::allowlist::{allowed_mime_types, allows_text_fallback, is_denied};
use crate::sniff::{ContentSniffer, MagicSniffer, MimeGuess};
use bytes::Bytes;
use portal_core::AppError;
use std::path::Path;
use std::sync::Arc;

/// Validation errors for submission attachments
#[derive(Debug, thiserror::Error)]
pub enum FileValidationError {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("File has no extension: {0}")]
    MissingExtension(String),

    #[error("File type .{0} is not permitted")]
    DeniedExtension(String),

    #[error("File extension .{0} is not supported")]
    ExtensionNotAllowed(String),

    #[error(
        "File content does not match .{extension} (detected: {}, declared: {})",
        .detected.as_deref().unwrap_or("unknown"),
        .declared.as_deref().unwrap_or("none")
    )]
    MimeMismatch {
        extension: String,
        detected: Option<String>,
        declared: Option<String>,
    },
}

impl From<FileValidationError> for AppError {
    fn from(err: FileValidationError) -> Self {
        AppError::FileValidation(err.to_string())
    }
}

/// An attachment as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub declared_mime: Option<String>,
    pub bytes: Bytes,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub extension: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Attachment validator
///
/// Checks run in a fixed order and the first failure wins: size, extension
/// presence, deny-list, allow-list, then content sniffing.
#[derive(Clone)]
pub struct FileValidator {
    max_file_size: usize,
    sniffer: Arc<dyn ContentSniffer>,
}

impl FileValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self::with_sniffer(max_file_size, Arc::new(MagicSniffer))
    }

    pub fn with_sniffer(max_file_size: usize, sniffer: Arc<dyn ContentSniffer>) -> Self {
        Self {
            max_file_size,
            sniffer,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), FileValidationError> {
        if size == 0 {
            return Err(FileValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(FileValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Lowercased extension of the final path segment of `filename`.
    pub fn extension_of(filename: &str) -> Result<String, FileValidationError> {
        let last_segment = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        Path::new(last_segment)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| FileValidationError::MissingExtension(filename.to_string()))
    }

    pub fn validate(&self, file: &IncomingFile) -> Result<ValidatedFile, FileValidationError> {
        self.validate_file_size(file.bytes.len())?;

        let extension = Self::extension_of(&file.filename)?;

        if is_denied(&extension) {
            return Err(FileValidationError::DeniedExtension(extension));
        }

        let allowed = allowed_mime_types(&extension)
            .ok_or_else(|| FileValidationError::ExtensionNotAllowed(extension.clone()))?;

        let guess = self.sniffer.detect(&file.bytes);
        let declared = file
            .declared_mime
            .as_deref()
            .map(normalize_mime_type)
            .filter(|m| !m.is_empty());

        let mime_type = resolve_mime(&extension, allowed, guess, declared.as_deref())
            .ok_or_else(|| FileValidationError::MimeMismatch {
                extension: extension.clone(),
                detected: guess.known().map(str::to_string),
                declared: declared.clone(),
            })?;

        tracing::debug!(
            extension = %extension,
            mime_type = %mime_type,
            detected = ?guess,
            size_bytes = file.bytes.len(),
            "Attachment passed validation"
        );

        Ok(ValidatedFile {
            extension,
            mime_type,
            size_bytes: file.bytes.len(),
        })
    }
}

/// Pick the canonical MIME type, or `None` when the file must be rejected.
///
/// Either the detected or the declared type may vouch for the file. A
/// detected executable rejects regardless of what was declared.
fn resolve_mime(
    extension: &str,
    allowed: &[&'static str],
    guess: MimeGuess,
    declared: Option<&str>,
) -> Option<String> {
    if guess.is_executable() {
        return None;
    }

    if let Some(detected) = guess.known() {
        if allowed.contains(&detected) {
            return Some(detected.to_string());
        }
    }

    if let Some(declared) = declared {
        if allowed.contains(&declared) {
            return Some(declared.to_string());
        }
    }

    let undeterminable = guess == MimeGuess::NoOpinion
        && declared
            .map(|d| d == "application/octet-stream")
            .unwrap_or(true);
    if undeterminable && allows_text_fallback(extension) {
        return allowed.first().map(|m| m.to_string());
    }

    None
}

/// Strip parameters and lowercase a MIME type ("Text/Plain; charset=utf-8" -> "text/plain").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}
