//! Budget routes: the budget itself, its categories, mini-pools and expenses.
//!
//! Responses carry the nested [`Budget`] shape; edits run on the store's tree.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use grantwise_core::budget::{
    Budget, BudgetPatch, BudgetRollup, BudgetTree, CategoryPatch, ExpensePatch, ExpenseStatus, MiniPoolPatch,
    NewBudget, NewCategory, NewExpense, NewMiniPool,
};
use grantwise_shared::types::{BudgetId, CategoryId, ExpenseId, GrantId, MiniPoolId};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route(
            "/budgets/{budget_id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/budgets/{budget_id}/summary", get(get_budget_summary))
        .route("/budgets/{budget_id}/categories", post(create_category))
        .route(
            "/budgets/{budget_id}/categories/{category_id}",
            put(update_category).delete(delete_category),
        )
        .route(
            "/budgets/{budget_id}/categories/{category_id}/mini-pools",
            post(create_mini_pool),
        )
        .route(
            "/budgets/{budget_id}/mini-pools/{mini_pool_id}",
            put(update_mini_pool).delete(delete_mini_pool),
        )
        .route(
            "/budgets/{budget_id}/mini-pools/{mini_pool_id}/expenses",
            post(create_expense),
        )
        .route(
            "/budgets/{budget_id}/expenses/{expense_id}",
            put(update_expense).delete(delete_expense),
        )
        .route(
            "/budgets/{budget_id}/expenses/{expense_id}/status",
            put(set_expense_status),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing budgets.
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Only budgets of this grant.
    pub grant_id: Option<GrantId>,
}

/// Request body for flipping an expense between spent and planned.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// New status.
    pub status: ExpenseStatus,
}

// ============================================================================
// Budgets
// ============================================================================

/// GET `/budgets`
async fn list_budgets(
    State(state): State<AppState>,
    Query(query): Query<ListBudgetsQuery>,
) -> Json<Vec<Budget>> {
    let store = state.store.read().await;
    let budgets = match query.grant_id {
        Some(grant_id) => store.budgets_of(grant_id).map(|t| t.to_budget()).collect(),
        None => store.budgets().map(|t| t.to_budget()).collect(),
    };
    Json(budgets)
}

/// POST `/budgets`
async fn create_budget(
    State(state): State<AppState>,
    Json(payload): Json<NewBudget>,
) -> Result<impl IntoResponse, ApiError> {
    let budget = state
        .mutate(|store| Ok(store.add_budget(payload)?.to_budget()))
        .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// GET `/budgets/{budget_id}`
async fn get_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.budget(budget_id)?.to_budget()))
}

/// PUT `/budgets/{budget_id}` - Replace the category tree and/or fiscal year.
async fn update_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
    Json(payload): Json<BudgetPatch>,
) -> Result<Json<Budget>, ApiError> {
    let budget = state
        .mutate(|store| Ok(store.update_budget(budget_id, payload)?.to_budget()))
        .await?;
    Ok(Json(budget))
}

/// DELETE `/budgets/{budget_id}`
async fn delete_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|store| {
            store.delete_budget(budget_id)?;
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/budgets/{budget_id}/summary` - Spent/remaining/percent at every level.
async fn get_budget_summary(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<BudgetRollup>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.budget(budget_id)?.rollup()))
}

/// Runs `edit` on one budget's tree and returns its result with the nested budget.
async fn edit_tree<T, F>(
    state: &AppState,
    budget_id: BudgetId,
    edit: F,
) -> Result<(T, Budget), ApiError>
where
    F: FnOnce(&mut BudgetTree) -> Result<T, ApiError>,
{
    state
        .mutate(|store| {
            let tree = store.budget_mut(budget_id)?;
            let value = edit(tree)?;
            Ok((value, tree.to_budget()))
        })
        .await
}

// ============================================================================
// Categories
// ============================================================================

/// POST `/budgets/{budget_id}/categories`
async fn create_category(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
    let (category_id, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.add_category(payload)?)
    })
    .await?;
    info!(budget_id = %budget_id, category_id = %category_id, "Category created");
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT `/budgets/{budget_id}/categories/{category_id}`
async fn update_category(
    State(state): State<AppState>,
    Path((budget_id, category_id)): Path<(BudgetId, CategoryId)>,
    Json(payload): Json<CategoryPatch>,
) -> Result<Json<Budget>, ApiError> {
    let ((), budget) = edit_tree(&state, budget_id, |tree| {
        tree.update_category(category_id, payload)?;
        Ok(())
    })
    .await?;
    Ok(Json(budget))
}

/// DELETE `/budgets/{budget_id}/categories/{category_id}` - Removes the whole subtree.
async fn delete_category(
    State(state): State<AppState>,
    Path((budget_id, category_id)): Path<(BudgetId, CategoryId)>,
) -> Result<Json<Budget>, ApiError> {
    let (removed, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.remove_category(category_id)?)
    })
    .await?;
    info!(
        budget_id = %budget_id,
        category = %removed.name,
        mini_pools = removed.mini_pools.len(),
        "Category deleted"
    );
    Ok(Json(budget))
}

// ============================================================================
// Mini-pools
// ============================================================================

/// POST `/budgets/{budget_id}/categories/{category_id}/mini-pools`
async fn create_mini_pool(
    State(state): State<AppState>,
    Path((budget_id, category_id)): Path<(BudgetId, CategoryId)>,
    Json(payload): Json<NewMiniPool>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.add_mini_pool(category_id, payload)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT `/budgets/{budget_id}/mini-pools/{mini_pool_id}`
async fn update_mini_pool(
    State(state): State<AppState>,
    Path((budget_id, mini_pool_id)): Path<(BudgetId, MiniPoolId)>,
    Json(payload): Json<MiniPoolPatch>,
) -> Result<Json<Budget>, ApiError> {
    let ((), budget) = edit_tree(&state, budget_id, |tree| {
        tree.update_mini_pool(mini_pool_id, payload)?;
        Ok(())
    })
    .await?;
    Ok(Json(budget))
}

/// DELETE `/budgets/{budget_id}/mini-pools/{mini_pool_id}`
async fn delete_mini_pool(
    State(state): State<AppState>,
    Path((budget_id, mini_pool_id)): Path<(BudgetId, MiniPoolId)>,
) -> Result<Json<Budget>, ApiError> {
    let (_, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.remove_mini_pool(mini_pool_id)?)
    })
    .await?;
    Ok(Json(budget))
}

// ============================================================================
// Expenses
// ============================================================================

/// POST `/budgets/{budget_id}/mini-pools/{mini_pool_id}/expenses`
async fn create_expense(
    State(state): State<AppState>,
    Path((budget_id, mini_pool_id)): Path<(BudgetId, MiniPoolId)>,
    Json(payload): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let (expense_id, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.add_expense(mini_pool_id, payload)?)
    })
    .await?;
    info!(budget_id = %budget_id, expense_id = %expense_id, "Expense recorded");
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT `/budgets/{budget_id}/expenses/{expense_id}`
async fn update_expense(
    State(state): State<AppState>,
    Path((budget_id, expense_id)): Path<(BudgetId, ExpenseId)>,
    Json(payload): Json<ExpensePatch>,
) -> Result<Json<Budget>, ApiError> {
    let ((), budget) = edit_tree(&state, budget_id, |tree| {
        tree.update_expense(expense_id, payload)?;
        Ok(())
    })
    .await?;
    Ok(Json(budget))
}

/// PUT `/budgets/{budget_id}/expenses/{expense_id}/status`
async fn set_expense_status(
    State(state): State<AppState>,
    Path((budget_id, expense_id)): Path<(BudgetId, ExpenseId)>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Budget>, ApiError> {
    let status = payload.status;
    let ((), budget) = edit_tree(&state, budget_id, |tree| {
        tree.set_expense_status(expense_id, status)?;
        Ok(())
    })
    .await?;
    info!(expense_id = %expense_id, status = %status, "Expense status changed");
    Ok(Json(budget))
}

/// DELETE `/budgets/{budget_id}/expenses/{expense_id}`
async fn delete_expense(
    State(state): State<AppState>,
    Path((budget_id, expense_id)): Path<(BudgetId, ExpenseId)>,
) -> Result<Json<Budget>, ApiError> {
    let (_, budget) = edit_tree(&state, budget_id, |tree| {
        Ok(tree.remove_expense(expense_id)?)
    })
    .await?;
    Ok(Json(budget))
}
