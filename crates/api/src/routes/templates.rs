//! Template routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use grantwise_core::document::{NewTemplate, Template, TemplatePatch};
use grantwise_shared::types::TemplateId;

use crate::{AppState, error::ApiError};

/// Creates the template routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{template_id}",
            get(get_template).put(update_template).delete(delete_template),
        )
}

async fn list_templates(State(state): State<AppState>) -> Json<Vec<Template>> {
    let store = state.store.read().await;
    Json(store.templates().cloned().collect())
}

async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<NewTemplate>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state
        .mutate(|store| Ok(store.add_template(payload)?.clone()))
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<Template>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.template(template_id)?.clone()))
}

async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
    Json(payload): Json<TemplatePatch>,
) -> Result<Json<Template>, ApiError> {
    let template = state
        .mutate(|store| Ok(store.update_template(template_id, payload)?.clone()))
        .await?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|store| {
            store.delete_template(template_id)?;
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
