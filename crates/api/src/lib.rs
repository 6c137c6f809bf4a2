//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes over the entity store
//! - Error-to-response mapping
//! - Snapshot persistence after every mutation, committed only once written

pub mod error;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use grantwise_core::extraction::ExpenseExtractor;
use grantwise_core::storage::DocumentStorage;
use grantwise_store::{EntityStore, save_snapshot};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entity store; handlers hold the lock for one operation.
    pub store: Arc<RwLock<EntityStore>>,
    /// Document extraction collaborator (optional).
    pub extractor: Option<Arc<dyn ExpenseExtractor>>,
    /// Document blob storage.
    pub storage: Arc<DocumentStorage>,
    /// Snapshot file; `None` keeps everything in memory.
    pub snapshot_path: Option<PathBuf>,
}

impl AppState {
    /// Builds the state around an existing store.
    pub fn new(store: EntityStore, storage: DocumentStorage) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            extractor: None,
            storage: Arc::new(storage),
            snapshot_path: None,
        }
    }

    /// Sets the extraction collaborator.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ExpenseExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Persists every mutation to `path`.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Runs one store edit under the write lock and persists it.
    ///
    /// With a snapshot path the edit runs on a copy that replaces the live
    /// store only once the snapshot is written. A failed write leaves the
    /// store as it was.
    pub async fn mutate<T, F>(&self, edit: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut EntityStore) -> Result<T, ApiError>,
    {
        let mut store = self.store.write().await;
        if self.snapshot_path.is_none() {
            return edit(&mut *store);
        }
        let mut working = store.clone();
        let value = edit(&mut working)?;
        self.persist(&working).await?;
        *store = working;
        Ok(value)
    }

    /// Writes the snapshot when a path is configured.
    ///
    /// Called with the write guard still held so snapshots never interleave.
    async fn persist(&self, store: &EntityStore) -> Result<(), ApiError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        save_snapshot(store, path).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to save snapshot");
            ApiError::from(e)
        })
    }
}

/// Creates the main application router.
///
/// Request bodies are capped at the storage's maximum upload size.
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.storage.config().max_file_size).unwrap_or(usize::MAX);
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
