//! Arena representation of a budget.
//!
//! Categories, mini-pools and expenses live in flat maps keyed by id. Parents
//! keep ordered child id lists, so an edit is an id lookup instead of a
//! rebuild of the nested arrays.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use grantwise_shared::types::{
    AimId, BudgetId, CategoryId, DocumentId, ExpenseId, GrantId, MiniPoolId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;
use super::service::BudgetService;
use super::types::{
    Budget, Category, CategoryPatch, Expense, ExpensePatch, ExpenseStatus, MiniPool,
    MiniPoolPatch, NewBudget, NewCategory, NewExpense, NewMiniPool,
};

/// A category slot in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Category ID.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// Allocated amount.
    pub allocated: Decimal,
    /// Explicit aim link.
    pub aim_id: Option<AimId>,
    /// Child mini-pools in order.
    pub mini_pool_ids: Vec<MiniPoolId>,
}

/// A mini-pool slot in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniPoolNode {
    /// Mini-pool ID.
    pub id: MiniPoolId,
    /// Parent category.
    pub category_id: CategoryId,
    /// Description.
    pub description: String,
    /// Allocated amount.
    pub allocated: Decimal,
    /// Child expenses in order.
    pub expense_ids: Vec<ExpenseId>,
}

/// Id-addressed budget tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Budget", into = "Budget")]
pub struct BudgetTree {
    id: BudgetId,
    grant_id: GrantId,
    total_budget: Decimal,
    fiscal_year: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_order: Vec<CategoryId>,
    categories: HashMap<CategoryId, CategoryNode>,
    mini_pools: HashMap<MiniPoolId, MiniPoolNode>,
    expenses: HashMap<ExpenseId, Expense>,
    expense_parent: HashMap<ExpenseId, MiniPoolId>,
}

impl BudgetTree {
    /// Creates an empty budget with a locked total.
    pub fn new(input: NewBudget) -> Result<Self, BudgetError> {
        BudgetService::validate_allocation(input.total_budget)?;
        let now = Utc::now();
        Ok(Self {
            id: BudgetId::new(),
            grant_id: input.grant_id,
            total_budget: input.total_budget,
            fiscal_year: input.fiscal_year.trim().to_string(),
            created_at: now,
            updated_at: now,
            category_order: Vec::new(),
            categories: HashMap::new(),
            mini_pools: HashMap::new(),
            expenses: HashMap::new(),
            expense_parent: HashMap::new(),
        })
    }

    /// Budget ID.
    pub fn id(&self) -> BudgetId {
        self.id
    }

    /// Owning grant.
    pub fn grant_id(&self) -> GrantId {
        self.grant_id
    }

    /// Locked ceiling.
    pub fn total_budget(&self) -> Decimal {
        self.total_budget
    }

    /// Fiscal year label.
    pub fn fiscal_year(&self) -> &str {
        &self.fiscal_year
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Categories in order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryNode> {
        self.category_order
            .iter()
            .filter_map(|id| self.categories.get(id))
    }

    /// Looks up a category.
    pub fn category(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.categories.get(&id)
    }

    /// Mini-pools of a category in order. Unknown categories yield nothing.
    pub fn mini_pools_of(&self, category_id: CategoryId) -> impl Iterator<Item = &MiniPoolNode> {
        self.categories
            .get(&category_id)
            .map(|c| c.mini_pool_ids.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.mini_pools.get(id))
    }

    /// All mini-pools, category by category.
    pub fn all_mini_pools(&self) -> impl Iterator<Item = &MiniPoolNode> {
        self.categories().flat_map(|c| self.mini_pools_of(c.id))
    }

    /// Looks up a mini-pool.
    pub fn mini_pool(&self, id: MiniPoolId) -> Option<&MiniPoolNode> {
        self.mini_pools.get(&id)
    }

    /// Expenses of a mini-pool in order. Unknown mini-pools yield nothing.
    pub fn expenses_of(&self, mini_pool_id: MiniPoolId) -> impl Iterator<Item = &Expense> {
        self.mini_pools
            .get(&mini_pool_id)
            .map(|m| m.expense_ids.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.expenses.get(id))
    }

    /// Looks up an expense.
    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.get(&id)
    }

    /// Mini-pool an expense lives in.
    pub fn expense_parent(&self, id: ExpenseId) -> Option<MiniPoolId> {
        self.expense_parent.get(&id).copied()
    }

    /// Number of expenses across the whole tree.
    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    /// Sets the fiscal year label.
    pub fn set_fiscal_year(&mut self, fiscal_year: &str) {
        self.fiscal_year = fiscal_year.trim().to_string();
        self.touch();
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Adds a category at the end.
    pub fn add_category(&mut self, input: NewCategory) -> Result<CategoryId, BudgetError> {
        let name = BudgetService::validate_name(&input.name, "name")?;
        BudgetService::validate_allocation(input.allocated)?;

        let id = CategoryId::new();
        self.categories.insert(
            id,
            CategoryNode {
                id,
                name,
                allocated: input.allocated,
                aim_id: input.aim_id,
                mini_pool_ids: Vec::new(),
            },
        );
        self.category_order.push(id);
        self.touch();
        Ok(id)
    }

    /// Edits a category in place.
    pub fn update_category(
        &mut self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<&CategoryNode, BudgetError> {
        let name = patch
            .name
            .as_deref()
            .map(|n| BudgetService::validate_name(n, "name"))
            .transpose()?;
        if let Some(allocated) = patch.allocated {
            BudgetService::validate_allocation(allocated)?;
        }

        let node = self
            .categories
            .get_mut(&id)
            .ok_or(BudgetError::CategoryNotFound(id))?;
        if let Some(name) = name {
            node.name = name;
        }
        if let Some(allocated) = patch.allocated {
            node.allocated = allocated;
        }
        if let Some(aim_id) = patch.aim_id {
            node.aim_id = aim_id;
        }
        self.touch();
        Ok(&self.categories[&id])
    }

    /// Removes a category together with its mini-pools and their expenses.
    pub fn remove_category(&mut self, id: CategoryId) -> Result<Category, BudgetError> {
        let removed = self
            .nested_category(id)
            .ok_or(BudgetError::CategoryNotFound(id))?;
        let node = self
            .categories
            .remove(&id)
            .ok_or(BudgetError::CategoryNotFound(id))?;
        self.category_order.retain(|c| *c != id);
        for mini_pool_id in node.mini_pool_ids {
            self.drop_mini_pool(mini_pool_id);
        }
        self.touch();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Mini-pools
    // ------------------------------------------------------------------

    /// Adds a mini-pool at the end of a category.
    pub fn add_mini_pool(
        &mut self,
        category_id: CategoryId,
        input: NewMiniPool,
    ) -> Result<MiniPoolId, BudgetError> {
        let description = BudgetService::validate_name(&input.description, "description")?;
        BudgetService::validate_allocation(input.allocated)?;

        let category = self
            .categories
            .get_mut(&category_id)
            .ok_or(BudgetError::CategoryNotFound(category_id))?;
        let id = MiniPoolId::new();
        category.mini_pool_ids.push(id);
        self.mini_pools.insert(
            id,
            MiniPoolNode {
                id,
                category_id,
                description,
                allocated: input.allocated,
                expense_ids: Vec::new(),
            },
        );
        self.touch();
        Ok(id)
    }

    /// Edits a mini-pool in place.
    pub fn update_mini_pool(
        &mut self,
        id: MiniPoolId,
        patch: MiniPoolPatch,
    ) -> Result<&MiniPoolNode, BudgetError> {
        let description = patch
            .description
            .as_deref()
            .map(|d| BudgetService::validate_name(d, "description"))
            .transpose()?;
        if let Some(allocated) = patch.allocated {
            BudgetService::validate_allocation(allocated)?;
        }

        let node = self
            .mini_pools
            .get_mut(&id)
            .ok_or(BudgetError::MiniPoolNotFound(id))?;
        if let Some(description) = description {
            node.description = description;
        }
        if let Some(allocated) = patch.allocated {
            node.allocated = allocated;
        }
        self.touch();
        Ok(&self.mini_pools[&id])
    }

    /// Removes a mini-pool together with its expenses.
    pub fn remove_mini_pool(&mut self, id: MiniPoolId) -> Result<MiniPool, BudgetError> {
        let parent = self
            .mini_pools
            .get(&id)
            .map(|m| m.category_id)
            .ok_or(BudgetError::MiniPoolNotFound(id))?;
        let removed = self
            .nested_mini_pool(id)
            .ok_or(BudgetError::MiniPoolNotFound(id))?;
        if let Some(category) = self.categories.get_mut(&parent) {
            category.mini_pool_ids.retain(|m| *m != id);
        }
        self.drop_mini_pool(id);
        self.touch();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Expenses
    // ------------------------------------------------------------------

    /// Appends a validated expense to a mini-pool.
    pub fn add_expense(
        &mut self,
        mini_pool_id: MiniPoolId,
        input: NewExpense,
    ) -> Result<ExpenseId, BudgetError> {
        let (description, amount) = BudgetService::validate_new_expense(&input)?;

        let mini_pool = self
            .mini_pools
            .get_mut(&mini_pool_id)
            .ok_or(BudgetError::MiniPoolNotFound(mini_pool_id))?;
        let id = ExpenseId::new();
        mini_pool.expense_ids.push(id);
        self.expenses.insert(
            id,
            Expense {
                id,
                description,
                amount,
                vendor: non_blank(input.vendor),
                date: input.date,
                status: input.status,
                receipt_doc_ids: input.receipt_doc_ids,
                linked_task_id: input.linked_task_id,
                notes: non_blank(input.notes),
            },
        );
        self.expense_parent.insert(id, mini_pool_id);
        self.touch();
        Ok(id)
    }

    /// Edits an expense in place.
    pub fn update_expense(
        &mut self,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<&Expense, BudgetError> {
        let description = patch
            .description
            .as_deref()
            .map(|d| BudgetService::validate_name(d, "description"))
            .transpose()?;
        if let Some(amount) = patch.amount {
            BudgetService::validate_amount(Some(amount))?;
        }

        let expense = self
            .expenses
            .get_mut(&id)
            .ok_or(BudgetError::ExpenseNotFound(id))?;
        if let Some(description) = description {
            expense.description = description;
        }
        if let Some(amount) = patch.amount {
            expense.amount = amount;
        }
        if let Some(vendor) = patch.vendor {
            expense.vendor = non_blank(Some(vendor));
        }
        if let Some(date) = patch.date {
            expense.date = Some(date);
        }
        if let Some(status) = patch.status {
            expense.status = status;
        }
        if let Some(receipts) = patch.receipt_doc_ids {
            expense.receipt_doc_ids = receipts;
        }
        if let Some(task) = patch.linked_task_id {
            expense.linked_task_id = task;
        }
        if let Some(notes) = patch.notes {
            expense.notes = non_blank(Some(notes));
        }
        self.touch();
        Ok(&self.expenses[&id])
    }

    /// Flips an expense between spent and planned.
    pub fn set_expense_status(
        &mut self,
        id: ExpenseId,
        status: ExpenseStatus,
    ) -> Result<&Expense, BudgetError> {
        self.update_expense(
            id,
            ExpensePatch {
                status: Some(status),
                ..ExpensePatch::default()
            },
        )
    }

    /// Removes an expense.
    pub fn remove_expense(&mut self, id: ExpenseId) -> Result<Expense, BudgetError> {
        let expense = self
            .expenses
            .remove(&id)
            .ok_or(BudgetError::ExpenseNotFound(id))?;
        if let Some(parent) = self.expense_parent.remove(&id)
            && let Some(mini_pool) = self.mini_pools.get_mut(&parent)
        {
            mini_pool.expense_ids.retain(|e| *e != id);
        }
        self.touch();
        Ok(expense)
    }

    /// Drops a document reference from every expense's receipt list.
    pub fn detach_receipt(&mut self, document_id: DocumentId) -> usize {
        let mut detached = 0;
        for expense in self.expenses.values_mut() {
            let before = expense.receipt_doc_ids.len();
            expense.receipt_doc_ids.retain(|d| *d != document_id);
            detached += before - expense.receipt_doc_ids.len();
        }
        if detached > 0 {
            self.touch();
        }
        detached
    }

    // ------------------------------------------------------------------
    // Whole-tree operations
    // ------------------------------------------------------------------

    /// Replaces the category tree with a nested one, keeping the locked total.
    ///
    /// Every node is validated before anything is replaced.
    pub fn replace_categories(&mut self, categories: Vec<Category>) -> Result<(), BudgetError> {
        Self::check_unique_ids(&categories)?;
        for category in &categories {
            BudgetService::validate_name(&category.name, "name")?;
            BudgetService::validate_allocation(category.allocated)?;
            for mini_pool in &category.mini_pools {
                BudgetService::validate_name(&mini_pool.description, "description")?;
                BudgetService::validate_allocation(mini_pool.allocated)?;
                for expense in &mini_pool.expenses {
                    BudgetService::validate_name(&expense.description, "description")?;
                    BudgetService::validate_amount(Some(expense.amount))?;
                }
            }
        }

        let mut rebuilt = Self::from_budget(Budget {
            id: self.id,
            grant_id: self.grant_id,
            total_budget: self.total_budget,
            fiscal_year: self.fiscal_year.clone(),
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        });
        rebuilt.touch();
        *self = rebuilt;
        Ok(())
    }

    /// Returns the first node id in `categories` that this tree already holds.
    pub fn shared_node_id(&self, categories: &[Category]) -> Option<String> {
        for category in categories {
            if self.categories.contains_key(&category.id) {
                return Some(format!("category {}", category.id));
            }
            for mini_pool in &category.mini_pools {
                if self.mini_pools.contains_key(&mini_pool.id) {
                    return Some(format!("mini-pool {}", mini_pool.id));
                }
                for expense in &mini_pool.expenses {
                    if self.expenses.contains_key(&expense.id) {
                        return Some(format!("expense {}", expense.id));
                    }
                }
            }
        }
        None
    }

    fn check_unique_ids(categories: &[Category]) -> Result<(), BudgetError> {
        let mut category_ids = HashSet::new();
        let mut mini_pool_ids = HashSet::new();
        let mut expense_ids = HashSet::new();
        for category in categories {
            if !category_ids.insert(category.id) {
                return Err(BudgetError::DuplicateId(format!("category {}", category.id)));
            }
            for mini_pool in &category.mini_pools {
                if !mini_pool_ids.insert(mini_pool.id) {
                    return Err(BudgetError::DuplicateId(format!("mini-pool {}", mini_pool.id)));
                }
                for expense in &mini_pool.expenses {
                    if !expense_ids.insert(expense.id) {
                        return Err(BudgetError::DuplicateId(format!("expense {}", expense.id)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the arena from the nested shape.
    pub fn from_budget(budget: Budget) -> Self {
        let mut tree = Self {
            id: budget.id,
            grant_id: budget.grant_id,
            total_budget: budget.total_budget,
            fiscal_year: budget.fiscal_year,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
            category_order: Vec::with_capacity(budget.categories.len()),
            categories: HashMap::new(),
            mini_pools: HashMap::new(),
            expenses: HashMap::new(),
            expense_parent: HashMap::new(),
        };

        for category in budget.categories {
            let mut mini_pool_ids = Vec::with_capacity(category.mini_pools.len());
            for mini_pool in category.mini_pools {
                let mut expense_ids = Vec::with_capacity(mini_pool.expenses.len());
                for expense in mini_pool.expenses {
                    expense_ids.push(expense.id);
                    tree.expense_parent.insert(expense.id, mini_pool.id);
                    tree.expenses.insert(expense.id, expense);
                }
                mini_pool_ids.push(mini_pool.id);
                tree.mini_pools.insert(
                    mini_pool.id,
                    MiniPoolNode {
                        id: mini_pool.id,
                        category_id: category.id,
                        description: mini_pool.description,
                        allocated: mini_pool.allocated,
                        expense_ids,
                    },
                );
            }
            tree.category_order.push(category.id);
            tree.categories.insert(
                category.id,
                CategoryNode {
                    id: category.id,
                    name: category.name,
                    allocated: category.allocated,
                    aim_id: category.aim_id,
                    mini_pool_ids,
                },
            );
        }
        tree
    }

    /// Renders the nested shape.
    pub fn to_budget(&self) -> Budget {
        Budget {
            id: self.id,
            grant_id: self.grant_id,
            total_budget: self.total_budget,
            fiscal_year: self.fiscal_year.clone(),
            categories: self
                .category_order
                .iter()
                .filter_map(|id| self.nested_category(*id))
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn nested_category(&self, id: CategoryId) -> Option<Category> {
        let node = self.categories.get(&id)?;
        Some(Category {
            id: node.id,
            name: node.name.clone(),
            allocated: node.allocated,
            aim_id: node.aim_id,
            mini_pools: node
                .mini_pool_ids
                .iter()
                .filter_map(|m| self.nested_mini_pool(*m))
                .collect(),
        })
    }

    fn nested_mini_pool(&self, id: MiniPoolId) -> Option<MiniPool> {
        let node = self.mini_pools.get(&id)?;
        Some(MiniPool {
            id: node.id,
            description: node.description.clone(),
            allocated: node.allocated,
            expenses: self.expenses_of(id).cloned().collect(),
        })
    }

    fn drop_mini_pool(&mut self, id: MiniPoolId) {
        if let Some(node) = self.mini_pools.remove(&id) {
            for expense_id in node.expense_ids {
                self.expenses.remove(&expense_id);
                self.expense_parent.remove(&expense_id);
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<Budget> for BudgetTree {
    fn from(budget: Budget) -> Self {
        Self::from_budget(budget)
    }
}

impl From<BudgetTree> for Budget {
    fn from(tree: BudgetTree) -> Self {
        tree.to_budget()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn empty_tree() -> BudgetTree {
        BudgetTree::new(NewBudget {
            grant_id: GrantId::new(),
            total_budget: dec!(50000),
            fiscal_year: "2025".to_string(),
        })
        .unwrap()
    }

    fn expense(description: &str, amount: Decimal) -> NewExpense {
        NewExpense {
            description: description.to_string(),
            amount: Some(amount),
            ..NewExpense::default()
        }
    }

    #[test]
    fn test_add_nodes_keeps_order() {
        let mut tree = empty_tree();
        let personnel = tree
            .add_category(NewCategory {
                name: "Personnel".into(),
                allocated: dec!(30000),
                aim_id: None,
            })
            .unwrap();
        let travel = tree
            .add_category(NewCategory {
                name: "Travel".into(),
                allocated: dec!(5000),
                aim_id: None,
            })
            .unwrap();

        let names: Vec<&str> = tree.categories().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Personnel", "Travel"]);
        assert_ne!(personnel, travel);
    }

    #[test]
    fn test_remove_category_cascades() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Equipment".into(),
                allocated: dec!(1000),
                aim_id: None,
            })
            .unwrap();
        let pool = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Laptops".into(),
                    allocated: dec!(1000),
                },
            )
            .unwrap();
        let first = tree.add_expense(pool, expense("Laptop", dec!(900))).unwrap();
        tree.add_expense(pool, expense("Dock", dec!(80))).unwrap();

        let removed = tree.remove_category(category).unwrap();

        assert_eq!(removed.mini_pools.len(), 1);
        assert_eq!(removed.mini_pools[0].expenses.len(), 2);
        assert!(tree.category(category).is_none());
        assert!(tree.mini_pool(pool).is_none());
        assert!(tree.expense(first).is_none());
        assert!(tree.expense_parent(first).is_none());
        assert_eq!(tree.expense_count(), 0);
    }

    #[test]
    fn test_remove_mini_pool_cascades_only_its_expenses() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Supplies".into(),
                allocated: dec!(500),
                aim_id: None,
            })
            .unwrap();
        let keep = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Lab".into(),
                    allocated: dec!(250),
                },
            )
            .unwrap();
        let drop = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Office".into(),
                    allocated: dec!(250),
                },
            )
            .unwrap();
        tree.add_expense(keep, expense("Pipettes", dec!(40))).unwrap();
        tree.add_expense(drop, expense("Paper", dec!(10))).unwrap();

        tree.remove_mini_pool(drop).unwrap();

        let remaining: Vec<MiniPoolId> = tree.mini_pools_of(category).map(|m| m.id).collect();
        assert_eq!(remaining, vec![keep]);
        assert_eq!(tree.expense_count(), 1);
    }

    #[test]
    fn test_update_keeps_id_and_total_budget() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Aim 1".into(),
                allocated: dec!(1000),
                aim_id: None,
            })
            .unwrap();

        let updated = tree
            .update_category(
                category,
                CategoryPatch {
                    allocated: Some(dec!(2500)),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, category);
        assert_eq!(updated.allocated, dec!(2500));
        assert_eq!(tree.total_budget(), dec!(50000));
    }

    #[test]
    fn test_invalid_expense_rejected_without_mutation() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Travel".into(),
                allocated: dec!(100),
                aim_id: None,
            })
            .unwrap();
        let pool = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Flights".into(),
                    allocated: dec!(100),
                },
            )
            .unwrap();

        let result = tree.add_expense(pool, expense("Flight", dec!(0)));

        assert!(matches!(result, Err(BudgetError::NonPositiveAmount(_))));
        assert_eq!(tree.expenses_of(pool).count(), 0);
    }

    #[test]
    fn test_unknown_parent_is_error() {
        let mut tree = empty_tree();
        let missing = MiniPoolId::new();
        let result = tree.add_expense(missing, expense("Ghost", dec!(1)));
        assert!(matches!(result, Err(BudgetError::MiniPoolNotFound(id)) if id == missing));
    }

    #[test]
    fn test_nested_round_trip_preserves_ids_and_order() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Personnel".into(),
                allocated: dec!(100),
                aim_id: Some(AimId::new()),
            })
            .unwrap();
        let pool = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Postdoc".into(),
                    allocated: dec!(100),
                },
            )
            .unwrap();
        let a = tree.add_expense(pool, expense("January", dec!(10))).unwrap();
        let b = tree.add_expense(pool, expense("February", dec!(10))).unwrap();

        let rebuilt = BudgetTree::from_budget(tree.to_budget());

        assert_eq!(rebuilt, tree);
        let order: Vec<ExpenseId> = rebuilt.expenses_of(pool).map(|e| e.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_replace_categories_validates_before_replacing() {
        let mut tree = empty_tree();
        tree.add_category(NewCategory {
            name: "Existing".into(),
            allocated: dec!(10),
            aim_id: None,
        })
        .unwrap();

        let bad = vec![Category {
            id: CategoryId::new(),
            name: "   ".into(),
            allocated: dec!(1),
            aim_id: None,
            mini_pools: vec![],
        }];

        assert!(tree.replace_categories(bad).is_err());
        assert_eq!(tree.categories().count(), 1);
        assert_eq!(tree.total_budget(), dec!(50000));
    }

    fn category_with_expense(id: CategoryId, expense_id: ExpenseId) -> Category {
        Category {
            id,
            name: "Shared".into(),
            allocated: dec!(100),
            aim_id: None,
            mini_pools: vec![MiniPool {
                id: MiniPoolId::new(),
                description: "Pool".into(),
                allocated: dec!(100),
                expenses: vec![Expense {
                    id: expense_id,
                    description: "Chairs".into(),
                    amount: dec!(100),
                    vendor: None,
                    date: None,
                    status: ExpenseStatus::Spent,
                    receipt_doc_ids: vec![],
                    linked_task_id: None,
                    notes: None,
                }],
            }],
        }
    }

    #[test]
    fn test_replace_categories_rejects_repeated_ids() {
        let mut tree = empty_tree();
        let category_id = CategoryId::new();
        let expense_id = ExpenseId::new();
        let repeated = vec![
            category_with_expense(category_id, expense_id),
            category_with_expense(category_id, expense_id),
        ];

        let err = tree.replace_categories(repeated).unwrap_err();

        assert!(matches!(err, BudgetError::DuplicateId(_)));
        assert!(err.is_validation());
        assert_eq!(tree.categories().count(), 0);
        assert_eq!(tree.expense_count(), 0);
    }

    #[test]
    fn test_replace_categories_rejects_repeated_expense_across_categories() {
        let mut tree = empty_tree();
        let expense_id = ExpenseId::new();
        let repeated = vec![
            category_with_expense(CategoryId::new(), expense_id),
            category_with_expense(CategoryId::new(), expense_id),
        ];

        assert!(matches!(
            tree.replace_categories(repeated),
            Err(BudgetError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_shared_node_id_finds_existing_expense() {
        let mut tree = empty_tree();
        let expense_id = ExpenseId::new();
        tree.replace_categories(vec![category_with_expense(CategoryId::new(), expense_id)])
            .unwrap();

        let other = vec![category_with_expense(CategoryId::new(), expense_id)];
        assert_eq!(
            tree.shared_node_id(&other),
            Some(format!("expense {expense_id}"))
        );
        assert_eq!(
            tree.shared_node_id(&[category_with_expense(CategoryId::new(), ExpenseId::new())]),
            None
        );
    }

    #[test]
    fn test_detach_receipt() {
        let mut tree = empty_tree();
        let category = tree
            .add_category(NewCategory {
                name: "Travel".into(),
                allocated: dec!(100),
                aim_id: None,
            })
            .unwrap();
        let pool = tree
            .add_mini_pool(
                category,
                NewMiniPool {
                    description: "Trains".into(),
                    allocated: dec!(100),
                },
            )
            .unwrap();
        let receipt = DocumentId::new();
        let id = tree
            .add_expense(
                pool,
                NewExpense {
                    receipt_doc_ids: vec![receipt],
                    ..expense("Ticket", dec!(20))
                },
            )
            .unwrap();

        assert_eq!(tree.detach_receipt(receipt), 1);
        assert!(tree.expense(id).unwrap().receipt_doc_ids.is_empty());
    }
}
