//! Parse boundary for submission requests.
//!
//! The `Content-Type` header is read once and selects a [`RequestBody`]
//! variant. Both variants produce the same [`ParsedSubmission`]; everything
//! past this module works on trimmed values where blank strings are already
//! `None`.

use crate::constants::ATTACHMENT_FIELD;
use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use bytes::Bytes;
use portal_core::{AppError, SubmissionFields};
use portal_processing::validator::normalize_mime_type;
use portal_processing::IncomingFile;
use serde::{Deserialize, Deserializer};

/// A submission after the parse boundary.
#[derive(Debug)]
pub struct ParsedSubmission {
    pub fields: SubmissionFields,
    pub attachment: Option<IncomingFile>,
}

/// Request body, tagged by its declared content type.
pub enum RequestBody {
    Json(Bytes),
    Multipart(Multipart),
}

impl RequestBody {
    pub async fn from_request(request: Request) -> Result<Self, AppError> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(normalize_mime_type)
            .unwrap_or_default();

        match content_type.as_str() {
            "application/json" => {
                let bytes = Bytes::from_request(request, &()).await.map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        return AppError::BadRequest("Request body too large".to_string());
                    }
                    AppError::BadRequest(format!("Unreadable request body: {}", e.body_text()))
                })?;
                Ok(RequestBody::Json(bytes))
            }
            "multipart/form-data" => {
                let multipart = Multipart::from_request(request, &()).await.map_err(|e| {
                    AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
                })?;
                Ok(RequestBody::Multipart(multipart))
            }
            "" => Err(AppError::BadRequest(
                "Missing Content-Type header".to_string(),
            )),
            other => Err(AppError::BadRequest(format!(
                "Unsupported content type: {}",
                other
            ))),
        }
    }

    pub async fn into_submission(self) -> Result<ParsedSubmission, AppError> {
        match self {
            RequestBody::Json(bytes) => {
                let raw: RawFields = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::BadRequest(format!("Invalid JSON body: {}", e))
                })?;
                Ok(ParsedSubmission {
                    fields: raw.into_fields()?,
                    attachment: None,
                })
            }
            RequestBody::Multipart(multipart) => read_multipart(multipart).await,
        }
    }
}

/// Read the body of `request` into a [`ParsedSubmission`].
pub async fn parse_submission(request: Request) -> Result<ParsedSubmission, AppError> {
    RequestBody::from_request(request)
        .await?
        .into_submission()
        .await
}

/// Field values exactly as received, before trimming.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "phone")]
    contact: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "share_name", deserialize_with = "flag_as_text")]
    share_name: Option<String>,
    #[serde(default)]
    website: Option<String>,
}

impl RawFields {
    fn into_fields(self) -> Result<SubmissionFields, AppError> {
        let share_name = match clean(self.share_name) {
            None => false,
            Some(value) => parse_flag(&value).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid shareName value: {}", value))
            })?,
        };

        Ok(SubmissionFields {
            name: clean(self.name),
            contact: clean(self.contact),
            email: clean(self.email),
            message: clean(self.message),
            share_name,
            website: clean(self.website),
        })
    }
}

/// JSON clients send `shareName` as a bool, a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagInput {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn flag_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<FlagInput>::deserialize(deserializer)?.map(|value| match value {
            FlagInput::Bool(b) => b.to_string(),
            FlagInput::Number(n) => n.to_string(),
            FlagInput::Text(s) => s,
        }),
    )
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Trim, and treat what is left of a blank value as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only an attachment can push a multipart body past the size limit.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::FileValidation(
            "File too large: exceeds the maximum upload size".to_string(),
        );
    }
    AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

async fn read_multipart(mut multipart: Multipart) -> Result<ParsedSubmission, AppError> {
    let mut raw = RawFields::default();
    let mut attachment = None;
    let mut attachment_parts = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == ATTACHMENT_FIELD {
            attachment_parts += 1;
            if attachment_parts > 1 {
                return Err(AppError::BadRequest(
                    "Only one attachment is allowed".to_string(),
                ));
            }

            let filename = field.file_name().unwrap_or_default().trim().to_string();
            let declared_mime = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part when the file input is left blank
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }

            attachment = Some(IncomingFile {
                filename,
                declared_mime,
                bytes,
            });
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut raw.name,
            "contact" | "phone" => &mut raw.contact,
            "email" => &mut raw.email,
            "message" => &mut raw.message,
            "shareName" | "share_name" => &mut raw.share_name,
            "website" => &mut raw.website,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(multipart_error)?);
    }

    Ok(ParsedSubmission {
        fields: raw.into_fields()?,
        attachment,
    })
}
