use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review state of a submission. Intake only ever writes `Pending` or `Flagged`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Flagged,
    Reviewed,
}

impl SubmissionStatus {
    /// Status for a freshly received submission given its spam verdict.
    pub fn from_spam_verdict(flagged: bool) -> Self {
        if flagged {
            SubmissionStatus::Flagged
        } else {
            SubmissionStatus::Pending
        }
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubmissionStatus::Pending => write!(f, "PENDING"),
            SubmissionStatus::Flagged => write!(f, "FLAGGED"),
            SubmissionStatus::Reviewed => write!(f, "REVIEWED"),
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "FLAGGED" => Ok(SubmissionStatus::Flagged),
            "REVIEWED" => Ok(SubmissionStatus::Reviewed),
            _ => Err(anyhow::anyhow!("Invalid submission status: {}", s)),
        }
    }
}

/// Caller-supplied fields after the parse boundary.
///
/// Strings are trimmed and blank values are already `None`, so the schema
/// rules below only ever see meaningful input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct SubmissionFields {
    #[validate(length(max = 120, message = "Name must be at most 120 characters"))]
    pub name: Option<String>,
    #[validate(
        required(message = "Contact number is required"),
        length(
            min = 3,
            max = 64,
            message = "Contact must be between 3 and 64 characters"
        )
    )]
    pub contact: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[validate(
        required(message = "Message is required"),
        length(
            min = 10,
            max = 2500,
            message = "Message must be between 10 and 2500 characters"
        )
    )]
    pub message: Option<String>,
    pub share_name: bool,
    /// Honeypot. Humans never see this input.
    pub website: Option<String>,
}

impl SubmissionFields {
    pub fn is_honeypot_filled(&self) -> bool {
        self.website.is_some()
    }
}

/// Metadata of an attachment that has been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredFileInfo {
    pub url: String,
    pub storage_key: String,
    pub original_filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// Everything needed to insert one submission row.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub name: Option<String>,
    pub contact: String,
    pub email: Option<String>,
    pub message: String,
    pub share_name: bool,
    pub ip_digest: String,
    pub locale: String,
    pub status: SubmissionStatus,
    pub attachment: Option<StoredFileInfo>,
}

/// A persisted submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Submission {
    pub id: Uuid,
    pub name: Option<String>,
    pub contact: String,
    pub email: Option<String>,
    pub message: String,
    pub share_name: bool,
    #[serde(skip_serializing)]
    pub ip_digest: String,
    pub locale: String,
    pub status: SubmissionStatus,
    pub attachment_url: Option<String>,
    pub attachment_key: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_size: Option<i64>,
    pub attachment_mime: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Build the row a repository would return for `new`.
    pub fn from_new(id: Uuid, new: NewSubmission, now: DateTime<Utc>) -> Self {
        let attachment = new.attachment;
        Self {
            id,
            name: new.name,
            contact: new.contact,
            email: new.email,
            message: new.message,
            share_name: new.share_name,
            ip_digest: new.ip_digest,
            locale: new.locale,
            status: new.status,
            attachment_url: attachment.as_ref().map(|a| a.url.clone()),
            attachment_key: attachment.as_ref().map(|a| a.storage_key.clone()),
            attachment_name: attachment.as_ref().map(|a| a.original_filename.clone()),
            attachment_size: attachment.as_ref().map(|a| a.size_bytes as i64),
            attachment_mime: attachment.map(|a| a.mime_type),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attachment metadata, present only when every attachment column is set.
    pub fn attachment(&self) -> Option<StoredFileInfo> {
        match (
            &self.attachment_url,
            &self.attachment_key,
            &self.attachment_name,
            self.attachment_size,
            &self.attachment_mime,
        ) {
            (Some(url), Some(key), Some(name), Some(size), Some(mime)) => Some(StoredFileInfo {
                url: url.clone(),
                storage_key: key.clone(),
                original_filename: name.clone(),
                size_bytes: size.max(0) as u64,
                mime_type: mime.clone(),
            }),
            _ => None,
        }
    }
}

/// Acknowledgement body for an accepted submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub ok: bool,
}

impl SubmissionResponse {
    pub fn accepted() -> Self {
        Self { ok: true }
    }
}
