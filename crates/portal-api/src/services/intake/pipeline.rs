use super::audit;
use super::parse::ParsedSubmission;
use super::IntakeContext;
use crate::error::storage_error;
use portal_core::{AppError, NewSubmission, StoredFileInfo, Submission, SubmissionStatus};
use portal_db::SubmissionRepository;
use portal_processing::{AttachmentStore, FileValidator, IncomingFile, SpamAssessor};
use std::sync::Arc;
use validator::Validate;

/// Runs a parsed submission through file handling, field validation, spam
/// scoring and persistence.
///
/// Each call makes at most one storage write and at most one insert, in that
/// order. Nothing is deduplicated.
pub struct IntakeService {
    validator: FileValidator,
    attachments: AttachmentStore,
    spam: SpamAssessor,
    repository: Arc<dyn SubmissionRepository>,
    spam_threshold: f64,
}

impl IntakeService {
    pub fn new(
        validator: FileValidator,
        attachments: AttachmentStore,
        spam: SpamAssessor,
        repository: Arc<dyn SubmissionRepository>,
        spam_threshold: f64,
    ) -> Self {
        Self {
            validator,
            attachments,
            spam,
            repository,
            spam_threshold,
        }
    }

    pub fn repository(&self) -> &Arc<dyn SubmissionRepository> {
        &self.repository
    }

    #[tracing::instrument(skip_all, fields(locale = %ctx.locale, has_attachment = parsed.attachment.is_some()))]
    pub async fn process(
        &self,
        ctx: &IntakeContext,
        parsed: ParsedSubmission,
    ) -> Result<Submission, AppError> {
        let ParsedSubmission { fields, attachment } = parsed;

        if fields.is_honeypot_filled() {
            audit::submission_rejected(ctx, "honeypot");
            return Err(AppError::Spam("honeypot field was filled".to_string()));
        }

        let stored = match &attachment {
            Some(file) => Some(self.store_attachment(ctx, file).await?),
            None => None,
        };

        if let Err(e) = fields.validate() {
            if let Some(file) = &stored {
                audit::orphaned_attachment(ctx, file, "validation");
            }
            return Err(e.into());
        }

        let (Some(contact), Some(message)) = (fields.contact, fields.message) else {
            return Err(AppError::Internal(
                "validated submission is missing required fields".to_string(),
            ));
        };

        let assessment = self.spam.assess(&message);
        let flagged = assessment.is_flagged(self.spam_threshold);
        tracing::debug!(
            score = assessment.score,
            reasons = ?assessment.reason_names(),
            flagged,
            "Message scored"
        );

        let submission = NewSubmission {
            name: fields.name,
            contact,
            email: fields.email,
            message,
            share_name: fields.share_name,
            ip_digest: ctx.ip_digest.clone(),
            locale: ctx.locale.clone(),
            status: SubmissionStatus::from_spam_verdict(flagged),
            attachment: stored.clone(),
        };

        match self.repository.create(submission).await {
            Ok(created) => {
                audit::submission_created(ctx, &created);
                Ok(created)
            }
            Err(e) => {
                if let Some(file) = &stored {
                    audit::orphaned_attachment(ctx, file, "persistence");
                }
                Err(e)
            }
        }
    }

    async fn store_attachment(
        &self,
        ctx: &IntakeContext,
        file: &IncomingFile,
    ) -> Result<StoredFileInfo, AppError> {
        let validated = self.validator.validate(file)?;
        let info = self
            .attachments
            .store(file, &validated)
            .await
            .map_err(storage_error)?;
        audit::attachment_stored(ctx, &info);
        Ok(info)
    }
}
