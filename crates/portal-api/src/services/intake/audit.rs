//! Audit trail of the intake pipeline.
//!
//! Events are emitted on the `audit` target so they can be routed separately
//! from diagnostic logs. Clients are identified by IP digest only.

use super::IntakeContext;
use portal_core::{StoredFileInfo, Submission};
use portal_infra::RateLimitDecision;

const TARGET: &str = "audit";

/// First event for a request; `request_id` ties later diagnostic logs to it.
pub fn submission_received(ctx: &IntakeContext, request_id: Option<&str>) {
    tracing::info!(
        target: TARGET,
        event = "submission_received",
        ip_digest = %ctx.ip_digest,
        locale = %ctx.locale,
        request_id = request_id.unwrap_or("-"),
        "Submission received"
    );
}

pub fn rate_limit_exceeded(ctx: &IntakeContext, decision: &RateLimitDecision) {
    tracing::warn!(
        target: TARGET,
        event = "rate_limit_exceeded",
        ip_digest = %ctx.ip_digest,
        limit = decision.limit,
        retry_after_secs = decision.retry_after_secs(),
        "Submission rate limit exceeded"
    );
}

pub fn submission_rejected(ctx: &IntakeContext, reason: &str) {
    tracing::warn!(
        target: TARGET,
        event = "submission_rejected",
        ip_digest = %ctx.ip_digest,
        reason,
        "Submission rejected"
    );
}

pub fn attachment_stored(ctx: &IntakeContext, file: &StoredFileInfo) {
    tracing::info!(
        target: TARGET,
        event = "attachment_stored",
        ip_digest = %ctx.ip_digest,
        storage_key = %file.storage_key,
        size_bytes = file.size_bytes,
        mime_type = %file.mime_type,
        "Attachment stored"
    );
}

pub fn submission_created(ctx: &IntakeContext, submission: &Submission) {
    tracing::info!(
        target: TARGET,
        event = "submission_created",
        ip_digest = %ctx.ip_digest,
        submission_id = %submission.id,
        status = %submission.status,
        locale = %submission.locale,
        has_attachment = submission.attachment_key.is_some(),
        "Submission created"
    );
}

/// The attachment stays in storage with no record pointing at it.
pub fn orphaned_attachment(ctx: &IntakeContext, file: &StoredFileInfo, stage: &str) {
    tracing::error!(
        target: TARGET,
        event = "orphaned_attachment",
        ip_digest = %ctx.ip_digest,
        storage_key = %file.storage_key,
        stage,
        "Stored attachment has no submission record"
    );
}
