//! Grant routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use grantwise_core::grant::{AimSpendBreakdown, Grant, GrantPatch, GrantStatus, NewGrant};
use grantwise_shared::types::{AimId, GrantId, PageRequest, PageResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::{AppState, error::ApiError};

/// Creates the grant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grants", get(list_grants).post(create_grant))
        .route(
            "/grants/{grant_id}",
            get(get_grant).put(update_grant).delete(delete_grant),
        )
        .route("/grants/{grant_id}/aims/{aim_id}/spend", get(get_aim_spend))
}

/// Filter for listing grants.
#[derive(Debug, Deserialize)]
pub struct GrantFilter {
    /// Only grants with this status.
    pub status: Option<GrantStatus>,
}

/// GET `/grants` - Paginated grant list.
async fn list_grants(
    State(state): State<AppState>,
    Query(filter): Query<GrantFilter>,
    Query(page): Query<PageRequest>,
) -> Json<PageResponse<Grant>> {
    let store = state.store.read().await;
    let grants: Vec<Grant> = store
        .grants()
        .filter(|g| filter.status.is_none_or(|s| g.status == s))
        .cloned()
        .collect();
    Json(page.paginate(&grants))
}

/// POST `/grants` - Create a grant.
async fn create_grant(
    State(state): State<AppState>,
    Json(payload): Json<NewGrant>,
) -> Result<impl IntoResponse, ApiError> {
    let grant = state
        .mutate(|store| Ok(store.add_grant(payload)?.clone()))
        .await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

/// GET `/grants/{grant_id}`
async fn get_grant(
    State(state): State<AppState>,
    Path(grant_id): Path<GrantId>,
) -> Result<Json<Grant>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.grant(grant_id)?.clone()))
}

/// PUT `/grants/{grant_id}` - Patch a grant.
async fn update_grant(
    State(state): State<AppState>,
    Path(grant_id): Path<GrantId>,
    Json(payload): Json<GrantPatch>,
) -> Result<Json<Grant>, ApiError> {
    let grant = state
        .mutate(|store| Ok(store.update_grant(grant_id, payload)?.clone()))
        .await?;
    Ok(Json(grant))
}

/// DELETE `/grants/{grant_id}` - Delete a grant and everything under it.
async fn delete_grant(
    State(state): State<AppState>,
    Path(grant_id): Path<GrantId>,
) -> Result<impl IntoResponse, ApiError> {
    let removal = state
        .mutate(|store| Ok(store.delete_grant(grant_id)?))
        .await?;

    for key in removal.documents.iter().filter_map(|d| d.storage_key.as_deref()) {
        if let Err(e) = state.storage.delete(key).await {
            warn!(error = %e, key, "Failed to delete document blob");
        }
    }

    Ok(Json(json!({
        "deleted": grant_id,
        "budgets": removal.budgets.len(),
        "documents": removal.documents.len(),
        "payment_requests": removal.payment_requests,
        "tasks": removal.tasks,
    })))
}

/// GET `/grants/{grant_id}/aims/{aim_id}/spend` - Aim spend and sub-aim distribution.
async fn get_aim_spend(
    State(state): State<AppState>,
    Path((grant_id, aim_id)): Path<(GrantId, AimId)>,
) -> Result<Json<AimSpendBreakdown>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.aim_spend(grant_id, aim_id)?))
}
