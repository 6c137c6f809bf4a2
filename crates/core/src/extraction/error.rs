//! Extraction error types.

use grantwise_shared::AppError;
use thiserror::Error;

/// Errors from the document extraction collaborator.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No extraction endpoint configured.
    #[error("Document extraction is not configured")]
    NotConfigured,

    /// The service rejected the credentials.
    #[error("Extraction service rejected the API key (status {0})")]
    Unauthorized(u16),

    /// An attempt ran past its deadline.
    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("Extraction request failed: {0}")]
    Transport(String),

    /// The service answered with an error status.
    #[error("Extraction service error (status {status}): {message}")]
    Service {
        /// HTTP status.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The response could not be decoded.
    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    /// The source document could not be read.
    #[error("Could not read source document: {0}")]
    Document(String),
}

impl ExtractionError {
    /// Returns true for setup problems the user has to fix (endpoint, credentials).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::Unauthorized(_))
    }

    /// Returns true for failures worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Service { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err.to_string())
        } else {
            Self::ExternalService(err.to_string())
        }
    }
}
