//! Attachment storage setup

use anyhow::{Context, Result};
use portal_core::Config;
use portal_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Create the upload root if needed and return the storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(
        &config.upload.upload_dir,
        config.upload.public_base_url.clone(),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to initialize upload directory {}",
            config.upload.upload_dir
        )
    })?;

    tracing::info!(
        backend = storage.backend_name(),
        upload_dir = %config.upload.upload_dir,
        public_base_url = %config.upload.public_base_url,
        max_upload_bytes = config.upload.max_upload_bytes,
        "Attachment storage initialized"
    );

    Ok(Arc::new(storage))
}
