//! Merging a reviewed draft into a budget tree.

use grantwise_shared::types::{AimId, CategoryId, ExpenseId, GrantId, MiniPoolId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::draft::{DraftLayout, ImportDraft, ImportGroup, ImportRow};
use super::error::ImportError;
use crate::budget::{BudgetTree, NewBudget, NewCategory, NewExpense, NewMiniPool};

/// Where flat rows land at the category level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryTarget {
    /// An existing category.
    Existing {
        /// Category ID.
        id: CategoryId,
    },
    /// A category created by the import.
    New {
        /// Name.
        name: String,
        /// Aim link.
        #[serde(default)]
        aim_id: Option<AimId>,
    },
}

/// Where flat rows land at the mini-pool level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MiniPoolTarget {
    /// An existing mini-pool of the target category.
    Existing {
        /// Mini-pool ID.
        id: MiniPoolId,
    },
    /// A mini-pool created by the import.
    New {
        /// Description.
        description: String,
    },
}

/// Destination for a flat draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatDestination {
    /// Category.
    pub category: CategoryTarget,
    /// Mini-pool.
    pub mini_pool: MiniPoolTarget,
}

/// Destination for a grouped draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupedDestination {
    /// One new mini-pool per group inside an existing category.
    ExistingCategory {
        /// Category ID.
        id: CategoryId,
    },
    /// One new category per group, each with a single mini-pool.
    NewCategories,
}

/// Where a draft is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "target", rename_all = "lowercase")]
pub enum ImportDestination {
    /// Flat draft target.
    Flat(FlatDestination),
    /// Grouped draft target.
    Grouped(GroupedDestination),
}

impl ImportDestination {
    fn layout(&self) -> DraftLayout {
        match self {
            Self::Flat(_) => DraftLayout::Flat,
            Self::Grouped(_) => DraftLayout::Grouped,
        }
    }
}

/// What an applied import created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Categories created.
    pub created_categories: Vec<CategoryId>,
    /// Mini-pools created.
    pub created_mini_pools: Vec<MiniPoolId>,
    /// Expenses created, in document order.
    pub created_expenses: Vec<ExpenseId>,
    /// Sum of the imported amounts.
    pub total_imported: Decimal,
}

/// Per-row match against the current tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMatch {
    /// Matched category.
    pub category_id: Option<CategoryId>,
    /// Matched mini-pool inside that category.
    pub mini_pool_id: Option<MiniPoolId>,
}

/// Suggested destination plus the matches it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSuggestion {
    /// Proposed destination; always applicable to the draft's layout.
    pub destination: ImportDestination,
    /// Matches for flat rows, in row order.
    pub row_matches: Vec<RowMatch>,
    /// Category matched by each group name, in group order.
    pub group_matches: Vec<Option<CategoryId>>,
}

/// Name used when the document suggests no category.
const DEFAULT_CATEGORY_NAME: &str = "Imported";

/// Import service for reconciling drafts with budgets.
pub struct ImportService;

impl ImportService {
    /// Matches the draft's suggestions against the tree.
    ///
    /// Unmatched suggestions become "create new" targets; rows are never
    /// dropped for lack of a match.
    #[must_use]
    pub fn suggest_destination(tree: &BudgetTree, draft: &ImportDraft) -> ImportSuggestion {
        let row_matches: Vec<RowMatch> = draft
            .rows
            .iter()
            .map(|row| Self::match_row(tree, row))
            .collect();
        let group_matches: Vec<Option<CategoryId>> = draft
            .groups
            .iter()
            .map(|g| tree.find_category(&g.name).map(|c| c.id))
            .collect();

        let destination = match draft.layout {
            DraftLayout::Flat => ImportDestination::Flat(Self::suggest_flat(tree, draft)),
            DraftLayout::Grouped => ImportDestination::Grouped(GroupedDestination::NewCategories),
        };

        ImportSuggestion {
            destination,
            row_matches,
            group_matches,
        }
    }

    fn match_row(tree: &BudgetTree, row: &ImportRow) -> RowMatch {
        let category = row
            .suggested_category
            .as_deref()
            .and_then(|name| tree.find_category(name));
        let mini_pool = category.and_then(|c| {
            row.suggested_mini_pool
                .as_deref()
                .and_then(|name| tree.find_mini_pool(c.id, name))
        });
        RowMatch {
            category_id: category.map(|c| c.id),
            mini_pool_id: mini_pool.map(|m| m.id),
        }
    }

    fn suggest_flat(tree: &BudgetTree, draft: &ImportDraft) -> FlatDestination {
        let lead = draft
            .selected_rows()
            .find(|r| r.suggested_category.is_some())
            .or_else(|| draft.rows.iter().find(|r| r.suggested_category.is_some()));
        let category_name = lead
            .and_then(|r| r.suggested_category.clone())
            .or_else(|| draft.suggested_category.clone());
        let mini_pool_name = lead
            .and_then(|r| r.suggested_mini_pool.clone())
            .or_else(|| category_name.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY_NAME.to_string());

        match category_name
            .as_deref()
            .and_then(|name| tree.find_category(name))
        {
            Some(category) => FlatDestination {
                category: CategoryTarget::Existing { id: category.id },
                mini_pool: match tree.find_mini_pool(category.id, &mini_pool_name) {
                    Some(pool) => MiniPoolTarget::Existing { id: pool.id },
                    None => MiniPoolTarget::New {
                        description: mini_pool_name,
                    },
                },
            },
            None => FlatDestination {
                category: CategoryTarget::New {
                    name: category_name.unwrap_or_else(|| DEFAULT_CATEGORY_NAME.to_string()),
                    aim_id: None,
                },
                mini_pool: MiniPoolTarget::New {
                    description: mini_pool_name,
                },
            },
        }
    }

    /// Applies the draft to `tree`.
    ///
    /// Works on a copy and swaps it in only on success, so a failed import
    /// leaves `tree` exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` for an empty or invalid selection, a destination
    /// that does not fit the draft, or unknown destination ids.
    pub fn apply(
        tree: &mut BudgetTree,
        draft: &ImportDraft,
        destination: &ImportDestination,
        grant_title: Option<&str>,
    ) -> Result<ImportOutcome, ImportError> {
        if draft.layout != destination.layout() {
            return Err(ImportError::LayoutMismatch {
                draft: draft.layout,
                destination: destination.layout(),
            });
        }
        draft.validate_selection()?;

        let note = draft.provenance_note(grant_title);
        let mut working = tree.clone();
        let outcome = match destination {
            ImportDestination::Flat(target) => {
                Self::apply_flat(&mut working, draft, target, &note)?
            }
            ImportDestination::Grouped(target) => {
                Self::apply_grouped(&mut working, draft, target, &note)?
            }
        };
        *tree = working;

        info!(
            budget_id = %tree.id(),
            expenses = outcome.created_expenses.len(),
            categories = outcome.created_categories.len(),
            mini_pools = outcome.created_mini_pools.len(),
            total = %outcome.total_imported,
            "Import applied"
        );
        Ok(outcome)
    }

    /// Creates a fresh budget for `grant_id` from a grouped draft.
    ///
    /// The ceiling is the document's stated total when it has one, otherwise
    /// the selected sum. Each group becomes a category.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` for a flat draft or an invalid selection.
    pub fn build_budget(
        grant_id: GrantId,
        fiscal_year: &str,
        draft: &ImportDraft,
        grant_title: Option<&str>,
    ) -> Result<(BudgetTree, ImportOutcome), ImportError> {
        if draft.layout != DraftLayout::Grouped {
            return Err(ImportError::LayoutMismatch {
                draft: draft.layout,
                destination: DraftLayout::Grouped,
            });
        }
        draft.validate_selection()?;

        let total_budget = draft
            .total_amount
            .filter(|t| *t >= Decimal::ZERO)
            .unwrap_or_else(|| draft.selected_total());
        let mut tree = BudgetTree::new(NewBudget {
            grant_id,
            total_budget,
            fiscal_year: fiscal_year.to_string(),
        })?;
        let outcome = Self::apply(
            &mut tree,
            draft,
            &ImportDestination::Grouped(GroupedDestination::NewCategories),
            grant_title,
        )?;
        Ok((tree, outcome))
    }

    fn apply_flat(
        tree: &mut BudgetTree,
        draft: &ImportDraft,
        target: &FlatDestination,
        note: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let selected_total = draft.selected_total();
        let mut outcome = ImportOutcome::default();

        let category_id = match &target.category {
            CategoryTarget::Existing { id } => {
                tree.category(*id).ok_or(ImportError::CategoryNotFound(*id))?;
                *id
            }
            CategoryTarget::New { name, aim_id } => {
                if matches!(target.mini_pool, MiniPoolTarget::Existing { .. }) {
                    return Err(ImportError::InvalidDestination(
                        "a new category needs a new mini-pool",
                    ));
                }
                let id = tree.add_category(NewCategory {
                    name: name.clone(),
                    allocated: selected_total,
                    aim_id: *aim_id,
                })?;
                outcome.created_categories.push(id);
                id
            }
        };

        let mini_pool_id = match &target.mini_pool {
            MiniPoolTarget::Existing { id } => {
                let pool = tree.mini_pool(*id).ok_or(ImportError::MiniPoolNotFound(*id))?;
                if pool.category_id != category_id {
                    return Err(ImportError::MiniPoolNotInCategory {
                        mini_pool: *id,
                        category: category_id,
                    });
                }
                *id
            }
            MiniPoolTarget::New { description } => {
                let id = tree.add_mini_pool(
                    category_id,
                    NewMiniPool {
                        description: description.clone(),
                        allocated: selected_total,
                    },
                )?;
                outcome.created_mini_pools.push(id);
                id
            }
        };

        Self::append_rows(tree, mini_pool_id, draft.rows.iter(), note, &mut outcome)?;
        Ok(outcome)
    }

    fn apply_grouped(
        tree: &mut BudgetTree,
        draft: &ImportDraft,
        target: &GroupedDestination,
        note: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let mut outcome = ImportOutcome::default();
        let groups = draft.groups.iter().filter(|g| g.has_selection());

        match target {
            GroupedDestination::ExistingCategory { id } => {
                tree.category(*id).ok_or(ImportError::CategoryNotFound(*id))?;
                for group in groups {
                    let pool = tree.add_mini_pool(
                        *id,
                        NewMiniPool {
                            description: group.name.clone(),
                            allocated: group.selected_total(),
                        },
                    )?;
                    outcome.created_mini_pools.push(pool);
                    Self::append_rows(tree, pool, group.rows.iter(), note, &mut outcome)?;
                }
            }
            GroupedDestination::NewCategories => {
                for group in groups {
                    let (category, pool) = Self::add_group_category(tree, group)?;
                    outcome.created_categories.push(category);
                    outcome.created_mini_pools.push(pool);
                    Self::append_rows(tree, pool, group.rows.iter(), note, &mut outcome)?;
                }
            }
        }
        Ok(outcome)
    }

    fn add_group_category(
        tree: &mut BudgetTree,
        group: &ImportGroup,
    ) -> Result<(CategoryId, MiniPoolId), ImportError> {
        let allocated = group.selected_total();
        let category = tree.add_category(NewCategory {
            name: group.name.clone(),
            allocated,
            aim_id: None,
        })?;
        let pool = tree.add_mini_pool(
            category,
            NewMiniPool {
                description: group.subtitle.clone().unwrap_or_else(|| group.name.clone()),
                allocated,
            },
        )?;
        Ok((category, pool))
    }

    fn append_rows<'a>(
        tree: &mut BudgetTree,
        mini_pool_id: MiniPoolId,
        rows: impl Iterator<Item = &'a ImportRow>,
        note: &str,
        outcome: &mut ImportOutcome,
    ) -> Result<(), ImportError> {
        for row in rows.filter(|r| r.selected) {
            let id = tree.add_expense(
                mini_pool_id,
                NewExpense {
                    description: row.name.clone(),
                    amount: row.amount,
                    vendor: row.vendor.clone(),
                    date: row.date,
                    status: row.status,
                    notes: Some(note.to_string()),
                    ..NewExpense::default()
                },
            )?;
            outcome.created_expenses.push(id);
            outcome.total_imported += row.amount.unwrap_or_default();
        }
        Ok(())
    }
}
