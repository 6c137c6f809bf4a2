//! Spent/allocated roll-up across category -> mini-pool -> expense.
//!
//! Everything here is recomputed from scratch on every call.

use grantwise_shared::types::{AimId, BudgetId, CategoryId, MiniPoolId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tree::BudgetTree;
use super::types::{Expense, ExpenseStatus};

/// Figures for one node of the budget tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Allocated amount.
    pub allocated: Decimal,
    /// Sum of spent expenses.
    pub spent: Decimal,
    /// Sum of planned expenses (never part of `spent`).
    pub planned: Decimal,
    /// `allocated - spent`; negative when over budget.
    pub remaining: Decimal,
    /// `spent / allocated * 100`, or 0 when nothing is allocated.
    pub percent_used: Decimal,
    /// `spent > allocated`.
    pub is_over_budget: bool,
}

impl NodeSummary {
    /// Builds the summary from raw figures.
    #[must_use]
    pub fn new(allocated: Decimal, spent: Decimal, planned: Decimal) -> Self {
        Self {
            allocated,
            spent,
            planned,
            remaining: allocated - spent,
            percent_used: percent_used(allocated, spent),
            is_over_budget: spent > allocated,
        }
    }
}

/// Utilization percentage with a zero-allocation guard, rounded to 2 dp.
#[must_use]
pub fn percent_used(allocated: Decimal, spent: Decimal) -> Decimal {
    if allocated > Decimal::ZERO {
        (spent / allocated * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Sums expense amounts with the given status.
pub fn sum_by_status<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    status: ExpenseStatus,
) -> Decimal {
    expenses
        .into_iter()
        .filter(|e| e.status == status)
        .map(|e| e.amount)
        .sum()
}

/// Roll-up of a mini-pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniPoolRollup {
    /// Mini-pool ID.
    pub id: MiniPoolId,
    /// Description.
    pub description: String,
    /// Figures.
    pub summary: NodeSummary,
    /// Number of expenses, spent and planned.
    pub expense_count: usize,
}

/// Roll-up of a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRollup {
    /// Category ID.
    pub id: CategoryId,
    /// Name.
    pub name: String,
    /// Explicit aim link.
    pub aim_id: Option<AimId>,
    /// Figures.
    pub summary: NodeSummary,
    /// Mini-pools in order.
    pub mini_pools: Vec<MiniPoolRollup>,
}

/// Roll-up of a whole budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRollup {
    /// Budget ID.
    pub budget_id: BudgetId,
    /// Locked ceiling.
    pub total_budget: Decimal,
    /// Sum of category allocations.
    pub allocated: Decimal,
    /// `total_budget - allocated`; negative when categories over-commit the ceiling.
    pub unallocated: Decimal,
    /// Budget-level figures measured against `total_budget`.
    pub summary: NodeSummary,
    /// Categories in order.
    pub categories: Vec<CategoryRollup>,
}

impl BudgetTree {
    /// Spent total of a mini-pool; unknown ids count as zero.
    pub fn mini_pool_spent(&self, id: MiniPoolId) -> Decimal {
        sum_by_status(self.expenses_of(id), ExpenseStatus::Spent)
    }

    /// Spent total of a category; unknown ids count as zero.
    pub fn category_spent(&self, id: CategoryId) -> Decimal {
        self.mini_pools_of(id)
            .map(|m| self.mini_pool_spent(m.id))
            .sum()
    }

    /// Spent total of the whole budget.
    pub fn total_spent(&self) -> Decimal {
        self.categories().map(|c| self.category_spent(c.id)).sum()
    }

    /// Summary of one mini-pool.
    pub fn mini_pool_summary(&self, id: MiniPoolId) -> Option<NodeSummary> {
        let node = self.mini_pool(id)?;
        Some(NodeSummary::new(
            node.allocated,
            self.mini_pool_spent(id),
            sum_by_status(self.expenses_of(id), ExpenseStatus::Planned),
        ))
    }

    /// Summary of one category.
    pub fn category_summary(&self, id: CategoryId) -> Option<NodeSummary> {
        let node = self.category(id)?;
        let planned = self
            .mini_pools_of(id)
            .map(|m| sum_by_status(self.expenses_of(m.id), ExpenseStatus::Planned))
            .sum();
        Some(NodeSummary::new(
            node.allocated,
            self.category_spent(id),
            planned,
        ))
    }

    /// Full roll-up at every level.
    pub fn rollup(&self) -> BudgetRollup {
        let categories: Vec<CategoryRollup> = self
            .categories()
            .map(|category| {
                let mini_pools: Vec<MiniPoolRollup> = self
                    .mini_pools_of(category.id)
                    .map(|m| MiniPoolRollup {
                        id: m.id,
                        description: m.description.clone(),
                        summary: NodeSummary::new(
                            m.allocated,
                            self.mini_pool_spent(m.id),
                            sum_by_status(self.expenses_of(m.id), ExpenseStatus::Planned),
                        ),
                        expense_count: m.expense_ids.len(),
                    })
                    .collect();
                let spent = mini_pools.iter().map(|m| m.summary.spent).sum();
                let planned = mini_pools.iter().map(|m| m.summary.planned).sum();
                CategoryRollup {
                    id: category.id,
                    name: category.name.clone(),
                    aim_id: category.aim_id,
                    summary: NodeSummary::new(category.allocated, spent, planned),
                    mini_pools,
                }
            })
            .collect();

        let allocated: Decimal = categories.iter().map(|c| c.summary.allocated).sum();
        let spent = categories.iter().map(|c| c.summary.spent).sum();
        let planned = categories.iter().map(|c| c.summary.planned).sum();

        BudgetRollup {
            budget_id: self.id(),
            total_budget: self.total_budget(),
            allocated,
            unallocated: self.total_budget() - allocated,
            summary: NodeSummary::new(self.total_budget(), spent, planned),
            categories,
        }
    }
}
