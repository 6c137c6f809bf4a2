//! Task routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use grantwise_core::grant::{NewTask, Task};
use grantwise_shared::types::GrantId;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Creates the task routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/tasks", get(list_tasks).post(create_task))
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Only tasks of this grant.
    pub grant_id: Option<GrantId>,
}

/// GET `/tasks`
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Json<Vec<Task>> {
    let store = state.store.read().await;
    Json(store.tasks(query.grant_id).cloned().collect())
}

/// POST `/tasks`
async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .mutate(|store| Ok(store.add_task(payload)?.clone()))
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}
