//! Document storage service implementation using Apache OpenDAL.

use grantwise_shared::types::{DocumentId, GrantId};
use opendal::{Builder, ErrorKind, Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::DocumentStorageError;

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Storage key.
    pub storage_key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type as uploaded.
    pub content_type: String,
}

/// Blob storage for uploaded documents.
pub struct DocumentStorage {
    operator: Operator,
    config: StorageConfig,
}

impl DocumentStorage {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, DocumentStorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// In-memory storage with default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be initialized.
    pub fn in_memory() -> Result<Self, DocumentStorageError> {
        Self::from_config(StorageConfig::new(StorageProvider::Memory))
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, DocumentStorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                finish_operator(builder)
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| DocumentStorageError::configuration("invalid path"))?;
                finish_operator(services::Fs::default().root(root))
            }
            StorageProvider::Memory => finish_operator(services::Memory::default()),
        }
    }

    /// Validate an upload against size and MIME constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), DocumentStorageError> {
        if size > self.config.max_file_size {
            return Err(DocumentStorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(DocumentStorageError::InvalidMimeType {
                mime_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Storage key for a document.
    ///
    /// Format: `{grant_id or "unassigned"}/{document_id}/{sanitized_file_name}`
    #[must_use]
    pub fn storage_key(
        grant_id: Option<GrantId>,
        document_id: DocumentId,
        file_name: &str,
    ) -> String {
        let grant_part = grant_id.map_or_else(|| "unassigned".to_string(), |id| id.to_string());
        format!("{grant_part}/{document_id}/{}", sanitize_filename(file_name))
    }

    /// Validates and writes a document blob.
    ///
    /// # Errors
    ///
    /// Returns a validation error before writing anything, or the backend error.
    pub async fn put(
        &self,
        grant_id: Option<GrantId>,
        document_id: DocumentId,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredBlob, DocumentStorageError> {
        let size_bytes = bytes.len() as u64;
        self.validate_upload(content_type, size_bytes)?;

        let storage_key = Self::storage_key(grant_id, document_id, file_name);
        self.operator.write(&storage_key, bytes).await?;
        debug!(key = %storage_key, size_bytes, "Document blob written");

        Ok(StoredBlob {
            storage_key,
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    /// Reads a blob back.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing blob and `InvalidKey` for keys that
    /// escape the storage root.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, DocumentStorageError> {
        check_key(key)?;
        self.operator
            .read(key)
            .await
            .map(|buffer| buffer.to_vec())
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DocumentStorageError::NotFound {
                    key: key.to_string(),
                },
                _ => DocumentStorageError::from(e),
            })
    }

    /// Deletes a blob. Deleting a missing blob succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), DocumentStorageError> {
        check_key(key)?;
        self.operator.delete(key).await?;
        debug!(key, "Document blob deleted");
        Ok(())
    }

    /// Check if a blob exists.
    pub async fn exists(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.operator.stat(key).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize filename for storage key.
///
/// Only ASCII alphanumerics, dots, hyphens and underscores survive. Names
/// that end up empty or made only of dots become `file`.
fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        sanitized
    }
}

fn check_key(key: &str) -> Result<(), DocumentStorageError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(DocumentStorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn finish_operator<B: Builder>(builder: B) -> Result<Operator, DocumentStorageError> {
    Ok(Operator::new(builder)
        .map_err(|e| DocumentStorageError::configuration(e.to_string()))?
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> DocumentStorage {
        DocumentStorage::in_memory().expect("memory backend")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_storage_key_with_grant() {
        let grant = GrantId::new();
        let doc = DocumentId::new();
        let key = DocumentStorage::storage_key(Some(grant), doc, "Budget v2.xlsx");
        assert_eq!(key, format!("{grant}/{doc}/Budget_v2.xlsx"));
    }

    #[test]
    fn test_storage_key_unassigned() {
        let key = DocumentStorage::storage_key(None, DocumentId::new(), "receipt.png");
        assert!(key.starts_with("unassigned/"));
    }

    #[test]
    fn test_validate_upload() {
        let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(1024);
        let storage = DocumentStorage::from_config(config).unwrap();

        assert!(storage.validate_upload("application/pdf", 512).is_ok());
        assert!(matches!(
            storage.validate_upload("application/pdf", 2048),
            Err(DocumentStorageError::FileTooLarge { size: 2048, max: 1024 })
        ));
        assert!(matches!(
            storage.validate_upload("application/x-executable", 10),
            Err(DocumentStorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_fs_backend_round_trip() {
        let root = std::env::temp_dir().join(format!("grantwise-docs-{}", uuid::Uuid::new_v4()));
        let storage =
            DocumentStorage::from_config(StorageConfig::new(StorageProvider::local_fs(&root)))
                .unwrap();
        assert_eq!(storage.config().provider.name(), "local");

        let blob = storage
            .put(None, DocumentId::new(), "receipt.txt", "text/plain", b"paid".to_vec())
            .await
            .unwrap();

        assert!(root.join(&blob.storage_key).exists());
        assert_eq!(storage.read(&blob.storage_key).await.unwrap(), b"paid");
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_put_read_delete() {
        let storage = storage();
        let grant = GrantId::new();
        let blob = storage
            .put(
                Some(grant),
                DocumentId::new(),
                "budget.csv",
                "text/csv",
                b"item,amount\nlaptop,1200\n".to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(blob.size_bytes, 24);
        assert!(storage.exists(&blob.storage_key).await);
        let bytes = storage.read(&blob.storage_key).await.unwrap();
        assert!(bytes.starts_with(b"item,amount"));

        storage.delete(&blob.storage_key).await.unwrap();
        assert!(!storage.exists(&blob.storage_key).await);
        assert!(matches!(
            storage.read(&blob.storage_key).await,
            Err(DocumentStorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let storage = storage();
        let doc = DocumentId::new();
        let result = storage
            .put(None, doc, "script.sh", "application/x-sh", b"echo".to_vec())
            .await;

        assert!(matches!(result, Err(DocumentStorageError::InvalidMimeType { .. })));
        let key = DocumentStorage::storage_key(None, doc, "script.sh");
        assert!(!storage.exists(&key).await);
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let storage = storage();
        assert!(matches!(
            storage.read("../etc/passwd").await,
            Err(DocumentStorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.delete("/abs").await,
            Err(DocumentStorageError::InvalidKey(_))
        ));
    }
}
