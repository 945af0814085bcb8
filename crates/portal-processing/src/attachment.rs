use crate::validator::{IncomingFile, ValidatedFile};
use chrono::Utc;
use portal_core::StoredFileInfo;
use portal_storage::{generate_storage_key, Storage, StorageResult};
use std::sync::Arc;

const MAX_ORIGINAL_NAME_CHARS: usize = 255;

/// Writes validated attachments to storage under server-generated keys.
#[derive(Clone)]
pub struct AttachmentStore {
    storage: Arc<dyn Storage>,
}

impl AttachmentStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, file, validated), fields(extension = %validated.extension))]
    pub async fn store(
        &self,
        file: &IncomingFile,
        validated: &ValidatedFile,
    ) -> StorageResult<StoredFileInfo> {
        let storage_key = generate_storage_key(&validated.extension, Utc::now());
        let url = self
            .storage
            .put(&storage_key, file.bytes.clone(), &validated.mime_type)
            .await?;

        Ok(StoredFileInfo {
            url,
            storage_key,
            original_filename: display_name(&file.filename),
            size_bytes: file.bytes.len() as u64,
            mime_type: validated.mime_type.clone(),
        })
    }
}

/// Client filename reduced to its final segment, kept only as metadata.
fn display_name(filename: &str) -> String {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim();
    last.chars()
        .filter(|c| !c.is_control())
        .take(MAX_ORIGINAL_NAME_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FileValidator;
    use bytes::Bytes;
    use portal_storage::LocalStorage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_reports_exact_size_and_safe_key() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads".to_string())
            .await
            .unwrap();
        let store = AttachmentStore::new(Arc::new(storage));

        let file = IncomingFile {
            filename: "../../etc/My Report.pdf".to_string(),
            declared_mime: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.4\n%test document\n"),
        };
        let validated = FileValidator::new(1024 * 1024).validate(&file).unwrap();
        let info = store.store(&file, &validated).await.unwrap();

        assert_eq!(info.size_bytes as usize, file.bytes.len());
        assert_eq!(info.mime_type, "application/pdf");
        assert_eq!(info.original_filename, "My Report.pdf");
        assert!(info.storage_key.ends_with(".pdf"));
        assert!(!info.storage_key.contains("Report"));
        assert_eq!(info.url, format!("/uploads/{}", info.storage_key));

        let on_disk = std::fs::read(dir.path().join(&info.storage_key)).unwrap();
        assert_eq!(on_disk, file.bytes.to_vec());
    }

    #[test]
    fn test_display_name_strips_path_and_controls() {
        assert_eq!(display_name("C:\\fakepath\\photo.png"), "photo.png");
        assert_eq!(display_name("a\u{0}b.txt"), "ab.txt");
        assert_eq!(display_name(&"x".repeat(300)).chars().count(), 255);
    }
}
