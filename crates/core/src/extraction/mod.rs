//! Document extraction collaborator.
//!
//! The extractor turns an uploaded document into line items. Only the trait
//! is consumed by the import flow; [`HttpExtractor`] is the production client
//! and [`RetryingExtractor`] adds per-attempt deadlines and retries.

pub mod client;
pub mod context;
pub mod error;
pub mod retry;
pub mod types;

use async_trait::async_trait;

pub use client::HttpExtractor;
pub use context::budget_context;
pub use error::ExtractionError;
pub use retry::RetryingExtractor;
pub use types::{ExtractedGroup, ExtractedItem, ExtractionResult, parse_amount};

/// A document handed to the extractor.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Declared document type, if the uploader set one.
    pub document_type: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Extracts line items from a document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseExtractor: Send + Sync {
    /// Extracts items from `document`. `budget_context` describes the current
    /// category/mini-pool tree so suggestions can name existing nodes.
    async fn extract(
        &self,
        document: &SourceDocument,
        budget_context: &str,
    ) -> Result<ExtractionResult, ExtractionError>;
}
