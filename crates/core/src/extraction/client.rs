//! HTTP client for the extraction service.

use std::time::Duration;

use async_trait::async_trait;
use grantwise_shared::config::ExtractionConfig;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::ExtractionError;
use super::types::ExtractionResult;
use super::{ExpenseExtractor, SourceDocument};

/// Request body posted to the extraction endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRequest<'a> {
    file_name: &'a str,
    content_type: &'a str,
    document_type: Option<&'a str>,
    /// URL-safe base64 of the document bytes.
    content: String,
    budget_context: &'a str,
}

/// Posts documents to a JSON extraction endpoint.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HttpExtractor {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::NotConfigured` when no endpoint is set.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ExtractionError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("grantwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExpenseExtractor for HttpExtractor {
    async fn extract(
        &self,
        document: &SourceDocument,
        budget_context: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let body = ExtractionRequest {
            file_name: &document.file_name,
            content_type: &document.content_type,
            document_type: document.document_type.as_deref(),
            content: base64_url::encode(&document.bytes),
            budget_context,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(
            endpoint = %self.endpoint,
            file_name = %document.file_name,
            size = document.bytes.len(),
            "Sending document for extraction"
        );

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout(self.timeout_secs)
            } else {
                ExtractionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(status = status.as_u16(), "Extraction service rejected credentials");
            return Err(ExtractionError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ExtractionResult>()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let err = HttpExtractor::from_config(&ExtractionConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_blank_endpoint_is_configuration_error() {
        let config = ExtractionConfig {
            endpoint: Some("   ".into()),
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            HttpExtractor::from_config(&config),
            Err(ExtractionError::NotConfigured)
        ));
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let config = ExtractionConfig {
            endpoint: Some("http://localhost:7000/extract".into()),
            api_key: Some(" ".into()),
            ..ExtractionConfig::default()
        };
        let client = HttpExtractor::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:7000/extract");
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_request_body_is_camel_case_base64() {
        let body = ExtractionRequest {
            file_name: "invoice.pdf",
            content_type: "application/pdf",
            document_type: Some("invoice"),
            content: base64_url::encode(b"hello"),
            budget_context: "Budget 2025",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["fileName"], "invoice.pdf");
        assert_eq!(json["content"], "aGVsbG8");
        assert_eq!(json["budgetContext"], "Budget 2025");
    }
}
