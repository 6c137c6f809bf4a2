//! Grant error types.

use chrono::NaiveDate;
use grantwise_shared::AppError;
use grantwise_shared::types::{AimId, GrantId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Grant-related errors.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Grant not found.
    #[error("Grant not found: {0}")]
    NotFound(GrantId),

    /// Aim not found on the grant.
    #[error("Aim {aim_id} not found on grant {grant_id}")]
    AimNotFound {
        /// Grant searched.
        grant_id: GrantId,
        /// Missing aim.
        aim_id: AimId,
    },

    /// A required text field is blank.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// Amounts cannot be negative.
    #[error("Amount cannot be negative, got {0}")]
    NegativeAmount(Decimal),

    /// End date precedes start date.
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Completion percentage above 100.
    #[error("Completion percentage must be between 0 and 100, got {0}")]
    InvalidCompletion(u8),

    /// Two aims share the same id.
    #[error("Duplicate aim id: {0}")]
    DuplicateAim(AimId),
}

impl GrantError {
    /// Returns true for input errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::AimNotFound { .. })
    }
}

impl From<GrantError> for AppError {
    fn from(err: GrantError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::NotFound(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_to_app_error() {
        let app: AppError = GrantError::MissingField("title").into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = GrantError::NotFound(GrantId::new()).into();
        assert_eq!(app.status_code(), 404);
    }
}
