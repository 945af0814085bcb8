//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Anything that converts into
//! `AppError` converts into `HttpAppError` too, so `?` works on every crate
//! error of the pipeline and the response shape stays the same everywhere:
//!
//! ```json
//! { "ok": false, "error": { "code": "VALIDATION", "message": "...", "issues": [...] } }
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use portal_core::{AppError, ErrorMetadata, FieldIssue, LogLevel};
use portal_processing::FileValidationError;
use portal_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code for programmatic handling
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<FieldIssue>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    fn from_app_error(error: &AppError) -> Self {
        Self {
            ok: false,
            error: ErrorBody {
                code: error.error_code().to_string(),
                message: error.client_message(),
                issues: error.issues().map(|issues| issues.to_vec()),
            },
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from portal-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<FileValidationError> for HttpAppError {
    fn from(err: FileValidationError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_error(err))
    }
}

impl From<sqlx::Error> for HttpAppError {
    fn from(err: sqlx::Error) -> Self {
        HttpAppError(err.into())
    }
}

impl From<validator::ValidationErrors> for HttpAppError {
    fn from(err: validator::ValidationErrors) -> Self {
        HttpAppError(err.into())
    }
}

/// Storage lives below portal-core, so its errors are folded in here.
pub fn storage_error(err: StorageError) -> AppError {
    AppError::FileStorage(err.to_string())
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    let details = error.detailed_message();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, code, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let mut response = (status, Json(ErrorResponse::from_app_error(app_error))).into_response();

        if let Some(secs) = app_error.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
