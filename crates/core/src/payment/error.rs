//! Payment workflow error types.

use grantwise_shared::AppError;
use grantwise_shared::types::PaymentRequestId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::PaymentStatus;

/// Errors that can occur during payment workflow operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PaymentStatus,
        /// The attempted target status.
        to: PaymentStatus,
    },

    /// Payment request not found.
    #[error("Payment request {0} not found")]
    NotFound(PaymentRequestId),

    /// Amount must be positive.
    #[error("Payment amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// A required text field is blank.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 409,
            Self::NotFound(_) => 404,
            Self::NonPositiveAmount(_) | Self::MissingField(_) | Self::RejectionReasonRequired => {
                400
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotFound(_) => "PAYMENT_REQUEST_NOT_FOUND",
            Self::NonPositiveAmount(_) => "INVALID_AMOUNT",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err.status_code() {
            404 => Self::NotFound(err.to_string()),
            409 => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
