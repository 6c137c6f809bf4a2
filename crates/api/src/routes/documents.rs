//! Document routes.
//!
//! Uploads send the file as the raw request body with its MIME type in
//! `Content-Type`; metadata rides in the query string.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use grantwise_core::document::{Document, DocumentPatch, NewDocument};
use grantwise_shared::types::{AimId, DocumentId, GrantId};
use grantwise_store::StoreError;
use serde::Deserialize;
use tracing::warn;

use crate::{AppState, error::ApiError};

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(upload_document))
        .route(
            "/documents/{document_id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/documents/{document_id}/content", get(download_document))
}

/// Metadata for an upload.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// File name.
    pub name: String,
    /// Kind of document.
    pub document_type: Option<String>,
    /// Owning grant.
    pub grant_id: Option<GrantId>,
    /// Owning aim.
    pub aim_id: Option<AimId>,
    /// Comma-separated tags.
    pub tags: Option<String>,
}

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    /// Only documents of this grant.
    pub grant_id: Option<GrantId>,
}

/// POST `/documents` - Store the blob, then register the document.
async fn upload_document(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let tags = query
        .tags
        .as_deref()
        .map(|t| {
            t.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let input = NewDocument {
        name: query.name,
        document_type: query.document_type,
        grant_id: query.grant_id,
        aim_id: query.aim_id,
        content_type: content_type.clone(),
        tags,
    };

    let document_id = DocumentId::new();
    let blob = state
        .storage
        .put(
            input.grant_id,
            document_id,
            &input.name,
            &content_type,
            body.to_vec(),
        )
        .await?;
    let key = blob.storage_key.clone();

    let added = state
        .mutate(|store| {
            Ok(store
                .add_uploaded_document(document_id, input, Some(blob))?
                .clone())
        })
        .await;
    match added {
        Ok(document) => Ok((StatusCode::CREATED, Json(document))),
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&key).await {
                warn!(error = %cleanup, key = %key, "Failed to remove orphaned blob");
            }
            Err(e)
        }
    }
}

/// GET `/documents`
async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> Json<Vec<Document>> {
    let store = state.store.read().await;
    Json(
        store
            .documents()
            .filter(|d| query.grant_id.is_none_or(|g| d.grant_id == Some(g)))
            .cloned()
            .collect(),
    )
}

/// GET `/documents/{document_id}`
async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<Document>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.document(document_id)?.clone()))
}

/// GET `/documents/{document_id}/content` - Raw blob.
async fn download_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.store.read().await.document(document_id)?.clone();
    let Some(key) = document.storage_key.as_deref() else {
        return Err(StoreError::DocumentNotFound(document_id).into());
    };
    let bytes = state.storage.read(key).await?;
    Ok(([(header::CONTENT_TYPE, document.content_type.clone())], bytes))
}

/// PUT `/documents/{document_id}`
async fn update_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    Json(payload): Json<DocumentPatch>,
) -> Result<Json<Document>, ApiError> {
    let document = state
        .mutate(|store| Ok(store.update_document(document_id, payload)?.clone()))
        .await?;
    Ok(Json(document))
}

/// DELETE `/documents/{document_id}` - Detaches receipts and removes the blob.
async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<StatusCode, ApiError> {
    let document = state
        .mutate(|store| Ok(store.delete_document(document_id)?))
        .await?;

    if let Some(key) = document.storage_key.as_deref()
        && let Err(e) = state.storage.delete(key).await
    {
        warn!(error = %e, key, "Failed to delete document blob");
    }
    Ok(StatusCode::NO_CONTENT)
}
