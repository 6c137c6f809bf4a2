//! Store error types.

use grantwise_core::budget::BudgetError;
use grantwise_core::grant::GrantError;
use grantwise_core::payment::PaymentError;
use grantwise_shared::AppError;
use grantwise_shared::types::{
    AimId, BudgetId, DocumentId, GrantId, MiniPoolId, PaymentRequestId, TaskId, TemplateId,
};
use thiserror::Error;

/// Error types for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Grant not found.
    #[error("Grant not found: {0}")]
    GrantNotFound(GrantId),

    /// Aim not found on the grant.
    #[error("Aim {aim_id} not found on grant {grant_id}")]
    AimNotFound {
        /// Grant searched.
        grant_id: GrantId,
        /// Missing aim.
        aim_id: AimId,
    },

    /// Budget not found.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// Mini-pool is not part of the budget.
    #[error("Mini-pool {mini_pool_id} is not part of budget {budget_id}")]
    MiniPoolNotInBudget {
        /// Budget searched.
        budget_id: BudgetId,
        /// Foreign mini-pool.
        mini_pool_id: MiniPoolId,
    },

    /// Budget belongs to another grant.
    #[error("Budget {budget_id} does not belong to grant {grant_id}")]
    BudgetNotInGrant {
        /// Budget named.
        budget_id: BudgetId,
        /// Grant named.
        grant_id: GrantId,
    },

    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Document id already taken.
    #[error("Document already exists: {0}")]
    DuplicateDocument(DocumentId),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Payment request not found.
    #[error("Payment request not found: {0}")]
    PaymentRequestNotFound(PaymentRequestId),

    /// Template not found.
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),

    /// A required text field is blank.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// Grant validation failed.
    #[error(transparent)]
    Grant(#[from] GrantError),

    /// Budget edit failed.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Payment workflow rejected the change.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Snapshot file I/O failed.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot contents could not be (de)serialized.
    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Grant(e) => e.into(),
            StoreError::Budget(e) => e.into(),
            StoreError::Payment(e) => e.into(),
            StoreError::GrantNotFound(_)
            | StoreError::AimNotFound { .. }
            | StoreError::BudgetNotFound(_)
            | StoreError::DocumentNotFound(_)
            | StoreError::TaskNotFound(_)
            | StoreError::PaymentRequestNotFound(_)
            | StoreError::TemplateNotFound(_) => Self::NotFound(err.to_string()),
            StoreError::DuplicateDocument(_) => Self::Conflict(err.to_string()),
            StoreError::MiniPoolNotInBudget { .. }
            | StoreError::BudgetNotInGrant { .. }
            | StoreError::MissingField(_) => Self::Validation(err.to_string()),
            StoreError::Io(_) | StoreError::Format(_) => Self::Storage(err.to_string()),
        }
    }
}
