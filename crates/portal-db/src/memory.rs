//! In-memory submission repository.

use crate::db::SubmissionRepository;
use chrono::Utc;
use portal_core::{AppError, NewSubmission, Submission};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Keeps submissions in a vector. Cloning shares the same storage.
///
/// `set_failing(true)` makes every call return a database error, which lets
/// callers exercise their failure paths without a real database.
#[derive(Clone, Default)]
pub struct InMemorySubmissionRepository {
    rows: Arc<Mutex<Vec<Submission>>>,
    failing: Arc<AtomicBool>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of every stored submission, oldest first.
    pub async fn all(&self) -> Vec<Submission> {
        self.rows.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, AppError> {
        self.check_available()?;
        let row = Submission::from_new(Uuid::new_v4(), submission, Utc::now());
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_available()
    }
}
