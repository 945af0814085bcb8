use portal_core::{AppError, NewSubmission, Submission};
use sqlx::{PgPool, Postgres};

const SUBMISSION_COLUMNS: &str = "id, name, contact, email, message, share_name, ip_digest, \
     locale, status, attachment_url, attachment_key, attachment_name, attachment_size, \
     attachment_mime, created_at, updated_at";

/// Trait for submission repository operations
#[async_trait::async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert one submission. Every call creates a new record.
    async fn create(&self, submission: NewSubmission) -> Result<Submission, AppError>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed submission repository
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    #[tracing::instrument(skip(self, submission), fields(
        db.system = "postgresql",
        db.table = "submissions",
        db.operation = "insert",
        status = %submission.status
    ))]
    async fn create(&self, submission: NewSubmission) -> Result<Submission, AppError> {
        let attachment = submission.attachment.as_ref();

        let row = sqlx::query_as::<Postgres, Submission>(&format!(
            r#"
            INSERT INTO submissions (
                name, contact, email, message, share_name, ip_digest, locale, status,
                attachment_url, attachment_key, attachment_name, attachment_size, attachment_mime
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(&submission.name)
        .bind(&submission.contact)
        .bind(&submission.email)
        .bind(&submission.message)
        .bind(submission.share_name)
        .bind(&submission.ip_digest)
        .bind(&submission.locale)
        .bind(submission.status)
        .bind(attachment.map(|a| a.url.as_str()))
        .bind(attachment.map(|a| a.storage_key.as_str()))
        .bind(attachment.map(|a| a.original_filename.as_str()))
        .bind(attachment.map(|a| a.size_bytes as i64))
        .bind(attachment.map(|a| a.mime_type.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to insert submission");
            AppError::from(e)
        })?;

        Ok(row)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
