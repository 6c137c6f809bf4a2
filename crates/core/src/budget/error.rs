//! Budget error types.

use grantwise_shared::AppError;
use grantwise_shared::types::{BudgetId, CategoryId, ExpenseId, MiniPoolId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Budget-related errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(BudgetId),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Mini-pool not found.
    #[error("Mini-pool not found: {0}")]
    MiniPoolNotFound(MiniPoolId),

    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// A required text field is blank.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// Amount was not provided.
    #[error("Amount is required")]
    MissingAmount,

    /// Expense amounts must be greater than zero.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Allocations cannot be negative.
    #[error("Allocation cannot be negative, got {0}")]
    NegativeAllocation(Decimal),

    /// A node id appears more than once in a replacement tree.
    #[error("Duplicate {0} id in budget tree")]
    DuplicateId(String),

    /// A node id already belongs to another budget.
    #[error("{0} id belongs to another budget")]
    IdInUse(String),
}

impl BudgetError {
    /// Returns true for input errors raised before any mutation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::MissingAmount
                | Self::NonPositiveAmount(_)
                | Self::NegativeAllocation(_)
                | Self::DuplicateId(_)
                | Self::IdInUse(_)
        )
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::NotFound(err.to_string())
        }
    }
}
