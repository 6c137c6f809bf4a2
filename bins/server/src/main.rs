//! Grantwise API Server
//!
//! Main entry point for the Grantwise backend service.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grantwise_api::{AppState, create_router};
use grantwise_core::extraction::{HttpExtractor, RetryingExtractor};
use grantwise_core::storage::{DocumentStorage, StorageConfig};
use grantwise_shared::AppConfig;
use grantwise_store::{EntityStore, load_snapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grantwise=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Load the entity store
    let snapshot_path = config.store.snapshot_path.as_deref().map(PathBuf::from);
    let store = match &snapshot_path {
        Some(path) => load_snapshot(path).await?,
        None => {
            warn!("No snapshot path configured, data will not survive a restart");
            EntityStore::new()
        }
    };
    info!(grants = store.grant_count(), "Entity store ready");

    // Document storage
    let storage = DocumentStorage::from_config(StorageConfig::from_settings(&config.storage))?;
    info!(
        provider = storage.provider_name(),
        root = %config.storage.root,
        "Document storage configured"
    );

    // Create application state
    let mut state = AppState::new(store, storage);
    if let Some(path) = snapshot_path {
        state = state.with_snapshot_path(path);
    }
    match HttpExtractor::from_config(&config.extraction) {
        Ok(client) => {
            let extractor = RetryingExtractor::from_config(Arc::new(client), &config.extraction);
            state = state.with_extractor(Arc::new(extractor));
            info!(
                timeout_secs = config.extraction.timeout_secs,
                max_retries = config.extraction.max_retries,
                "Document extraction enabled"
            );
        }
        Err(e) => warn!(error = %e, "Document extraction disabled"),
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
