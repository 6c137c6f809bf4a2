//! Document storage error types.

use grantwise_shared::AppError;
use thiserror::Error;

/// Document storage errors.
#[derive(Debug, Error)]
pub enum DocumentStorageError {
    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type not allowed.
    #[error("MIME type '{mime_type}' is not allowed")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// Blob not found.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Invalid storage key.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl DocumentStorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for DocumentStorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<DocumentStorageError> for AppError {
    fn from(err: DocumentStorageError) -> Self {
        match err {
            DocumentStorageError::FileTooLarge { .. }
            | DocumentStorageError::InvalidMimeType { .. }
            | DocumentStorageError::InvalidKey(_) => Self::Validation(err.to_string()),
            DocumentStorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            DocumentStorageError::Configuration(_) => Self::Configuration(err.to_string()),
            DocumentStorageError::Operation(_) => Self::Storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let too_large: AppError = DocumentStorageError::FileTooLarge { size: 9, max: 1 }.into();
        assert_eq!(too_large.status_code(), 400);

        let missing: AppError = DocumentStorageError::NotFound { key: "a/b".into() }.into();
        assert_eq!(missing.status_code(), 404);

        let io: AppError = DocumentStorageError::Operation("disk full".into()).into();
        assert_eq!(io.status_code(), 500);
        assert!(!io.is_client_visible());
    }
}
