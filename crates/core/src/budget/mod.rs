//! Budget tree, edits and spent/allocated aggregation.

pub mod aggregation;
pub mod error;
pub mod service;
pub mod tree;
pub mod types;


pub use aggregation::{BudgetRollup, CategoryRollup, MiniPoolRollup, NodeSummary};
pub use error::BudgetError;
pub use service::BudgetService;
pub use tree::{BudgetTree, CategoryNode, MiniPoolNode};
pub use types::{
    Budget, BudgetPatch, Category, CategoryPatch, Expense, ExpensePatch, ExpenseStatus, MiniPool,
    MiniPoolPatch, NewBudget, NewCategory, NewExpense, NewMiniPool,
};
