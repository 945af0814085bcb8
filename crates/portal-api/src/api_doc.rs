//! OpenAPI documentation, served at `crate::constants::OPENAPI_PATH`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use portal_core::{FieldIssue, SubmissionResponse};

/// Returns the OpenAPI document for the service.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portal Intake API",
        version = "0.1.0",
        description = "Public intake for citizen reports. Accepts a short message with contact details and at most one attachment. Submissions are rate limited per client and scored for spam before they are stored."
    ),
    paths(
        handlers::submit::submit,
        handlers::submit::submit_localized,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::submit::SubmissionRequest,
        handlers::health::HealthResponse,
        SubmissionResponse,
        error::ErrorResponse,
        error::ErrorBody,
        FieldIssue,
    )),
    tags(
        (name = "submissions", description = "Citizen report intake"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_both_submit_routes() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/submit"));
        assert!(spec.paths.paths.contains_key("/{locale}/api/submit"));
        assert!(spec.paths.paths.contains_key("/health"));
    }
}
