use crate::constants::{
    RATE_LIMIT_KEY_PREFIX, RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER,
};
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::intake::{audit, parse_submission, IntakeContext};
use crate::state::AppState;
use crate::utils::resolve_client_address;
use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use portal_core::{AppError, SubmissionResponse};
use portal_infra::{get_request_id, RateLimitDecision};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use utoipa::ToSchema;

/// Submission fields as accepted on the wire.
///
/// Sent as a JSON object, or as `multipart/form-data` parts with the same
/// names plus an optional `attachment` file part. `phone` is accepted for
/// `contact` and `share_name` for `shareName`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct SubmissionRequest {
    #[schema(max_length = 120)]
    name: Option<String>,
    #[schema(min_length = 3, max_length = 64)]
    contact: String,
    email: Option<String>,
    #[schema(min_length = 10, max_length = 2500)]
    message: String,
    /// `true`/`false`, or one of `"on"`, `"1"`, `"0"`, `"yes"`, `"no"`
    share_name: Option<bool>,
    /// Leave empty.
    website: Option<String>,
}

/// Submit a report under the default locale
#[utoipa::path(
    post,
    path = "/api/submit",
    tag = "submissions",
    request_body(content = SubmissionRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Submission accepted", body = SubmissionResponse),
        (status = 400, description = "Malformed body, rejected as spam, or attachment refused", body = ErrorResponse),
        (status = 422, description = "Field validation failed", body = ErrorResponse),
        (status = 429, description = "Too many submissions from this client", body = ErrorResponse),
        (status = 500, description = "Attachment storage or database failure", body = ErrorResponse)
    )
)]
pub async fn submit(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let locale = state.config.default_locale.clone();
    handle_submission(&state, locale, request).await
}

/// Submit a report under an explicit locale
#[utoipa::path(
    post,
    path = "/{locale}/api/submit",
    tag = "submissions",
    params(("locale" = String, Path, description = "One of the supported locales, e.g. `en` or `ne`")),
    request_body(content = SubmissionRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Submission accepted", body = SubmissionResponse),
        (status = 400, description = "Malformed body, rejected as spam, or attachment refused", body = ErrorResponse),
        (status = 404, description = "Unsupported locale", body = ErrorResponse),
        (status = 422, description = "Field validation failed", body = ErrorResponse),
        (status = 429, description = "Too many submissions from this client", body = ErrorResponse),
        (status = 500, description = "Attachment storage or database failure", body = ErrorResponse)
    )
)]
pub async fn submit_localized(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
    request: Request,
) -> Response {
    if !state.supports_locale(&locale) {
        return HttpAppError(AppError::NotFound(format!(
            "Unsupported locale: {}",
            locale
        )))
        .into_response();
    }
    handle_submission(&state, locale, request).await
}

async fn handle_submission(state: &AppState, locale: String, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let address = resolve_client_address(
        request.headers(),
        peer,
        state.config.trusted_proxy_count,
    );
    let ctx = IntakeContext {
        ip_digest: state.identity.digest(&address),
        locale,
    };
    audit::submission_received(&ctx, get_request_id(&request).as_deref());

    let key = format!("{}{}", RATE_LIMIT_KEY_PREFIX, ctx.ip_digest);
    let decision = state.rate_limiter.allow(&key).await;

    let mut response = if decision.allowed {
        match accept(state, &ctx, request).await {
            Ok(()) => (StatusCode::CREATED, Json(SubmissionResponse::accepted())).into_response(),
            Err(e) => e.into_response(),
        }
    } else {
        audit::rate_limit_exceeded(&ctx, &decision);
        HttpAppError(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        })
        .into_response()
    };

    apply_rate_limit_headers(&mut response, &decision);
    response
}

async fn accept(state: &AppState, ctx: &IntakeContext, request: Request) -> Result<(), HttpAppError> {
    let parsed = parse_submission(request).await?;
    state.intake.process(ctx, parsed).await?;
    Ok(())
}

fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert(RATE_LIMIT_LIMIT_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert(RATE_LIMIT_REMAINING_HEADER, value);
    }
}
