//! Budget data types.
//!
//! These are the nested shapes used at the persistence and HTTP boundaries.
//! Edits and aggregation run on the arena in [`super::tree::BudgetTree`].

use chrono::{DateTime, NaiveDate, Utc};
use grantwise_shared::types::{
    AimId, BudgetId, CategoryId, DocumentId, ExpenseId, GrantId, MiniPoolId, TaskId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an expense counts toward the used budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Money has gone out; counts toward spent totals.
    #[default]
    Spent,
    /// Future or committed spend; excluded from spent totals.
    Planned,
}

impl ExpenseStatus {
    /// Maps the legacy boolean flag: absent or `true` is spent, only `false` is planned.
    #[must_use]
    pub fn from_legacy_flag(spent: Option<bool>) -> Self {
        match spent {
            Some(false) => Self::Planned,
            Some(true) | None => Self::Spent,
        }
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spent => "spent",
            Self::Planned => "planned",
        }
    }

    /// Returns true if the expense counts toward spent totals.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        matches!(self, Self::Spent)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated monetary transaction inside a mini-pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// What the money was for.
    pub description: String,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Vendor or payee.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Transaction date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Spent or planned.
    #[serde(default)]
    pub status: ExpenseStatus,
    /// Receipts attached to this expense.
    #[serde(default)]
    pub receipt_doc_ids: Vec<DocumentId>,
    /// Task this expense is linked to.
    #[serde(default)]
    pub linked_task_id: Option<TaskId>,
    /// Free-form notes; imports record their provenance here.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Second-level budget bucket holding expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniPool {
    /// Mini-pool ID.
    pub id: MiniPoolId,
    /// Mini-pool description.
    pub description: String,
    /// Allocated amount.
    pub allocated: Decimal,
    /// Expenses in entry order.
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

/// Top-level budget bucket ("macro pool").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// Allocated amount.
    pub allocated: Decimal,
    /// Aim this category funds. Categories without one fall back to name matching.
    #[serde(default)]
    pub aim_id: Option<AimId>,
    /// Mini-pools in entry order.
    #[serde(default)]
    pub mini_pools: Vec<MiniPool>,
}

/// A grant budget in its nested form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning grant.
    pub grant_id: GrantId,
    /// Locked ceiling set at creation.
    pub total_budget: Decimal,
    /// Fiscal year label (e.g. "2025").
    #[serde(default)]
    pub fiscal_year: String,
    /// Categories in entry order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new budget.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    /// Owning grant.
    pub grant_id: GrantId,
    /// Locked ceiling.
    pub total_budget: Decimal,
    /// Fiscal year label.
    #[serde(default)]
    pub fiscal_year: String,
}

/// Partial budget update. The total budget is deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetPatch {
    /// New fiscal year label.
    pub fiscal_year: Option<String>,
    /// Replacement category tree.
    pub categories: Option<Vec<Category>>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    /// Category name.
    pub name: String,
    /// Allocated amount.
    #[serde(default)]
    pub allocated: Decimal,
    /// Aim this category funds.
    #[serde(default)]
    pub aim_id: Option<AimId>,
}

/// Partial category update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New allocation.
    pub allocated: Option<Decimal>,
    /// New aim link; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub aim_id: Option<Option<AimId>>,
}

/// Input for creating a mini-pool.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMiniPool {
    /// Mini-pool description.
    pub description: String,
    /// Allocated amount.
    #[serde(default)]
    pub allocated: Decimal,
}

/// Partial mini-pool update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MiniPoolPatch {
    /// New description.
    pub description: Option<String>,
    /// New allocation.
    pub allocated: Option<Decimal>,
}

/// Input for creating an expense.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExpense {
    /// What the money was for.
    #[serde(default)]
    pub description: String,
    /// Amount; must be present and positive.
    pub amount: Option<Decimal>,
    /// Vendor or payee.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Transaction date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Spent or planned.
    #[serde(default)]
    pub status: ExpenseStatus,
    /// Receipts to attach.
    #[serde(default)]
    pub receipt_doc_ids: Vec<DocumentId>,
    /// Linked task.
    #[serde(default)]
    pub linked_task_id: Option<TaskId>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial expense update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    /// New description.
    pub description: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New vendor.
    pub vendor: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New status.
    pub status: Option<ExpenseStatus>,
    /// Replacement receipt list.
    pub receipt_doc_ids: Option<Vec<DocumentId>>,
    /// New task link; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub linked_task_id: Option<Option<TaskId>>,
    /// New notes.
    pub notes: Option<String>,
}

/// Distinguishes an absent field from an explicit `null` in patches.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
