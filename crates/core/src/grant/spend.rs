//! Actual spend per aim and its estimated split over sub-aims.

use grantwise_shared::types::{AimId, SubAimId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::SpendAllocation;
use super::types::Aim;
use crate::budget::{BudgetTree, CategoryNode};
use crate::matching::label_matches;

/// Estimated spend of one sub-aim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAimSpend {
    /// Sub-aim ID.
    pub sub_aim_id: SubAimId,
    /// Display label.
    pub number: String,
    /// Title.
    pub title: String,
    /// Budgeted amount used as the weight.
    pub budget_allocation: Decimal,
    /// Aim spend times this sub-aim's share of the sibling allocations.
    pub estimated_spent: Decimal,
}

/// Actual spend of an aim with the per-sub-aim estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AimSpendBreakdown {
    /// Aim ID.
    pub aim_id: AimId,
    /// Display label.
    pub number: String,
    /// Budgeted amount.
    pub budget_allocation: Decimal,
    /// Spent total of every category funding the aim.
    pub actual_spend: Decimal,
    /// Sub-aims in order.
    pub sub_aims: Vec<SubAimSpend>,
}

/// Returns true if the category funds the aim.
///
/// An explicit aim link decides on its own. Categories without one fall back
/// to matching their name against the aim's label.
#[must_use]
pub fn category_funds_aim(category: &CategoryNode, aim: &Aim) -> bool {
    match category.aim_id {
        Some(aim_id) => aim_id == aim.id,
        None => label_matches(&category.name, &aim.number),
    }
}

/// Sums the spent totals of all categories funding `aim` across `budgets`.
///
/// Unmatched aims report zero.
pub fn aim_actual_spend<'a>(aim: &Aim, budgets: impl IntoIterator<Item = &'a BudgetTree>) -> Decimal {
    budgets
        .into_iter()
        .flat_map(|tree| {
            tree.categories()
                .filter(|c| category_funds_aim(c, aim))
                .map(|c| tree.category_spent(c.id))
        })
        .sum()
}

/// Computes the aim's actual spend and distributes it over its sub-aims.
pub fn aim_breakdown<'a>(
    aim: &Aim,
    budgets: impl IntoIterator<Item = &'a BudgetTree>,
) -> AimSpendBreakdown {
    let actual_spend = aim_actual_spend(aim, budgets);
    let weights: Vec<Decimal> = aim.sub_aims.iter().map(|s| s.budget_allocation).collect();
    let shares = SpendAllocation::distribute(actual_spend, &weights);

    AimSpendBreakdown {
        aim_id: aim.id,
        number: aim.number.clone(),
        budget_allocation: aim.budget_allocation,
        actual_spend,
        sub_aims: aim
            .sub_aims
            .iter()
            .zip(shares)
            .map(|(sub_aim, estimated_spent)| SubAimSpend {
                sub_aim_id: sub_aim.id,
                number: sub_aim.number.clone(),
                title: sub_aim.title.clone(),
                budget_allocation: sub_aim.budget_allocation,
                estimated_spent,
            })
            .collect(),
    }
}
