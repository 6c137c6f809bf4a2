//! Import error types.

use grantwise_shared::AppError;
use grantwise_shared::types::{CategoryId, MiniPoolId};
use thiserror::Error;

use super::draft::{DraftLayout, RowIndex};
use crate::budget::BudgetError;
use crate::extraction::ExtractionError;

/// Errors raised while staging or applying an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No row is selected.
    #[error("Select at least one row to import")]
    NothingSelected,

    /// A selected row cannot become an expense.
    #[error("Row {position} cannot be imported: {reason}")]
    InvalidRow {
        /// 1-based position in document order.
        position: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Row index outside the draft.
    #[error("No row at {0:?}")]
    RowNotFound(RowIndex),

    /// Destination kind does not fit the draft.
    #[error("A {draft:?} draft cannot be applied to a {destination:?} destination")]
    LayoutMismatch {
        /// Draft layout.
        draft: DraftLayout,
        /// Layout the destination expects.
        destination: DraftLayout,
    },

    /// Draft carries rows its layout never imports.
    #[error("A {0:?} draft cannot carry rows outside its layout")]
    RowsOutsideLayout(DraftLayout),

    /// Destination category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Destination mini-pool does not exist.
    #[error("Mini-pool not found: {0}")]
    MiniPoolNotFound(MiniPoolId),

    /// Mini-pool exists but under another category.
    #[error("Mini-pool {mini_pool} does not belong to category {category}")]
    MiniPoolNotInCategory {
        /// Mini-pool.
        mini_pool: MiniPoolId,
        /// Category it was expected in.
        category: CategoryId,
    },

    /// Destination combination that cannot be applied.
    #[error("Invalid destination: {0}")]
    InvalidDestination(&'static str),

    /// Session action not allowed in the current state.
    #[error("Cannot {action} while import is {state}")]
    InvalidState {
        /// Current state name.
        state: &'static str,
        /// Attempted action.
        action: &'static str,
    },

    /// Tree edit failed.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Budget(e) => e.into(),
            ImportError::Extraction(e) => e.into(),
            ImportError::CategoryNotFound(_) | ImportError::MiniPoolNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            ImportError::InvalidState { .. } => Self::Conflict(err.to_string()),
            ImportError::NothingSelected => Self::BusinessRule(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = ImportError::NothingSelected.into();
        assert_eq!(app.status_code(), 422);

        let app: AppError = ImportError::CategoryNotFound(CategoryId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = ImportError::Extraction(ExtractionError::NotConfigured).into();
        assert_eq!(app.status_code(), 503);

        let app: AppError = ImportError::InvalidRow {
            position: 1,
            reason: "name is blank".into(),
        }
        .into();
        assert_eq!(app.status_code(), 400);
    }
}
