//! Deadline and retry wrapper around any extractor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use grantwise_shared::config::ExtractionConfig;
use tracing::warn;

use super::error::ExtractionError;
use super::types::ExtractionResult;
use super::{ExpenseExtractor, SourceDocument};

/// Runs each attempt under a deadline and retries transient failures.
///
/// Configuration errors and malformed responses are returned immediately.
pub struct RetryingExtractor {
    inner: Arc<dyn ExpenseExtractor>,
    timeout: Duration,
    max_retries: u32,
}

impl RetryingExtractor {
    /// Wraps `inner` with an explicit deadline and retry count.
    pub fn new(inner: Arc<dyn ExpenseExtractor>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            inner,
            timeout,
            max_retries,
        }
    }

    /// Wraps `inner` using the configured deadline and retry count.
    pub fn from_config(inner: Arc<dyn ExpenseExtractor>, config: &ExtractionConfig) -> Self {
        Self::new(
            inner,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }
}

#[async_trait]
impl ExpenseExtractor for RetryingExtractor {
    async fn extract(
        &self,
        document: &SourceDocument,
        budget_context: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mut attempt = 0;
        loop {
            let outcome = tokio::time::timeout(
                self.timeout,
                self.inner.extract(document, budget_context),
            )
            .await
            .unwrap_or(Err(ExtractionError::Timeout(self.timeout.as_secs())));

            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt,
                        file_name = %document.file_name,
                        "Extraction attempt failed, retrying"
                    );
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractedItem, MockExpenseExtractor};
    use mockall::Sequence;

    fn document() -> SourceDocument {
        SourceDocument {
            file_name: "invoice.pdf".into(),
            content_type: "application/pdf".into(),
            document_type: Some("invoice".into()),
            bytes: vec![1, 2, 3],
        }
    }

    fn result() -> ExtractionResult {
        ExtractionResult {
            items: vec![ExtractedItem {
                name: Some("Laptop".into()),
                ..ExtractedItem::default()
            }],
            ..ExtractionResult::default()
        }
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() {
        let mut mock = MockExpenseExtractor::new();
        let mut seq = Sequence::new();
        mock.expect_extract()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ExtractionError::Transport("reset".into())));
        mock.expect_extract()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(result()));

        let extractor = RetryingExtractor::new(Arc::new(mock), Duration::from_secs(5), 1);
        let extracted = extractor.extract(&document(), "").await.unwrap();

        assert_eq!(extracted.items.len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut mock = MockExpenseExtractor::new();
        mock.expect_extract().times(2).returning(|_, _| {
            Err(ExtractionError::Service {
                status: 503,
                message: "busy".into(),
            })
        });

        let extractor = RetryingExtractor::new(Arc::new(mock), Duration::from_secs(5), 1);
        let err = extractor.extract(&document(), "").await.unwrap_err();

        assert!(matches!(err, ExtractionError::Service { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_configuration_error_is_not_retried() {
        let mut mock = MockExpenseExtractor::new();
        mock.expect_extract()
            .times(1)
            .returning(|_, _| Err(ExtractionError::Unauthorized(401)));

        let extractor = RetryingExtractor::new(Arc::new(mock), Duration::from_secs(5), 3);
        let err = extractor.extract(&document(), "").await.unwrap_err();

        assert!(err.is_configuration());
    }

    struct Stalled;

    #[async_trait]
    impl ExpenseExtractor for Stalled {
        async fn extract(
            &self,
            _document: &SourceDocument,
            _budget_context: &str,
        ) -> Result<ExtractionResult, ExtractionError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ExtractionResult::default())
        }
    }

    #[tokio::test]
    async fn test_deadline_turns_into_timeout() {
        let extractor = RetryingExtractor::new(Arc::new(Stalled), Duration::from_millis(20), 1);
        let err = extractor.extract(&document(), "").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(_)));
    }
}
