//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grantwise_core::budget::BudgetError;
use grantwise_core::extraction::ExtractionError;
use grantwise_core::grant::GrantError;
use grantwise_core::import::ImportError;
use grantwise_core::payment::PaymentError;
use grantwise_core::storage::DocumentStorageError;
use grantwise_shared::AppError;
use grantwise_store::StoreError;
use serde_json::json;
use tracing::error;

/// An error rendered as `{"error": CODE, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

macro_rules! via_app_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    Self(AppError::from(err))
                }
            }
        )*
    };
}

via_app_error!(
    BudgetError,
    ExtractionError,
    GrantError,
    ImportError,
    PaymentError,
    DocumentStorageError,
    StoreError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_client_visible() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "Request failed");
            "An error occurred".to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let response = ApiError::from(AppError::Validation("bad amount".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("bad amount"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_message() {
        let response = ApiError::from(AppError::Storage("/var/data: denied".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_extraction_configuration_is_503() {
        let response = ApiError::from(ExtractionError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
