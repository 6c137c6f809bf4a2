//! Document import routes.
//!
//! Extraction and apply are separate requests; the reviewed draft travels
//! back with the apply call, so no session state lives on the server.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use grantwise_core::budget::{Budget, BudgetTree, NewBudget};
use grantwise_core::extraction::{ExtractionError, SourceDocument};
use grantwise_core::import::{
    FailureKind, ImportDestination, ImportDraft, ImportOutcome, ImportService, ImportSession,
    ImportState, ImportSuggestion,
};
use grantwise_shared::AppError;
use grantwise_shared::types::{BudgetId, DocumentId, GrantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the import routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets/{budget_id}/imports/extract", post(extract_for_budget))
        .route("/budgets/{budget_id}/imports/apply", post(apply_to_budget))
        .route("/grants/{grant_id}/imports/extract", post(extract_for_grant))
        .route("/grants/{grant_id}/budgets/import", post(import_budget))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for running extraction on a stored document.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Uploaded document to read.
    pub document_id: DocumentId,
}

/// Extracted draft with match suggestions against the target budget.
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    /// Staged rows, all selected.
    pub draft: ImportDraft,
    /// Suggested destination and per-row matches.
    pub suggestion: ImportSuggestion,
}

/// Request body for applying a reviewed draft to a budget.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Reviewed draft.
    pub draft: ImportDraft,
    /// Where the selected rows go.
    pub destination: ImportDestination,
    /// Grant title for the provenance note; defaults to the budget's grant.
    #[serde(default)]
    pub grant_title: Option<String>,
}

/// Result of applying a draft.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    /// Nodes and expenses created.
    pub outcome: ImportOutcome,
    /// Budget after the import.
    pub budget: Budget,
}

/// Request body for creating a budget from a grouped draft.
#[derive(Debug, Deserialize)]
pub struct ImportBudgetRequest {
    /// Reviewed grouped draft.
    pub draft: ImportDraft,
    /// Fiscal year of the new budget.
    #[serde(default)]
    pub fiscal_year: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/budgets/{budget_id}/imports/extract`
async fn extract_for_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let tree = state.store.read().await.budget(budget_id)?.clone();
    run_extraction(&state, payload.document_id, &tree).await.map(Json)
}

/// POST `/grants/{grant_id}/imports/extract` - Extraction before any budget exists.
async fn extract_for_grant(
    State(state): State<AppState>,
    Path(grant_id): Path<GrantId>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    state.store.read().await.grant(grant_id)?;
    let tree = BudgetTree::new(NewBudget {
        grant_id,
        total_budget: Decimal::ZERO,
        fiscal_year: String::new(),
    })?;
    run_extraction(&state, payload.document_id, &tree).await.map(Json)
}

/// POST `/budgets/{budget_id}/imports/apply`
async fn apply_to_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<BudgetId>,
    Json(payload): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, ApiError> {
    let ApplyRequest {
        draft,
        destination,
        grant_title,
    } = payload;
    let mut session = ImportSession::reviewing(draft);
    let (outcome, budget) = state
        .mutate(|store| {
            let grant_title = match grant_title {
                Some(title) => Some(title),
                None => {
                    let grant_id = store.budget(budget_id)?.grant_id();
                    store.grant(grant_id).ok().map(|g| g.title.clone())
                }
            };
            let tree = store.budget_mut(budget_id)?;
            let outcome = session.apply(tree, &destination, grant_title.as_deref())?;
            Ok((outcome, tree.to_budget()))
        })
        .await?;
    Ok(Json(ApplyResponse { outcome, budget }))
}

/// POST `/grants/{grant_id}/budgets/import` - New budget from a grouped draft.
async fn import_budget(
    State(state): State<AppState>,
    Path(grant_id): Path<GrantId>,
    Json(payload): Json<ImportBudgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (outcome, budget) = state
        .mutate(|store| {
            let grant_title = store.grant(grant_id)?.title.clone();
            let (tree, outcome) = ImportService::build_budget(
                grant_id,
                &payload.fiscal_year,
                &payload.draft,
                Some(&grant_title),
            )?;
            Ok((outcome, store.insert_budget(tree)?.to_budget()))
        })
        .await?;
    info!(grant_id = %grant_id, budget_id = %budget.id, "Budget imported");
    Ok((StatusCode::CREATED, Json(ApplyResponse { outcome, budget })))
}

/// Reads the document blob and runs it through an import session.
async fn run_extraction(
    state: &AppState,
    document_id: DocumentId,
    tree: &BudgetTree,
) -> Result<ExtractResponse, ApiError> {
    let extractor = state
        .extractor
        .clone()
        .ok_or(ExtractionError::NotConfigured)?;
    let document = state.store.read().await.document(document_id)?.clone();
    let key = document.storage_key.as_deref().ok_or_else(|| {
        AppError::Validation(format!("Document {document_id} has no stored file"))
    })?;
    let bytes = state.storage.read(key).await?;

    let mut session = ImportSession::new();
    session.begin(SourceDocument {
        file_name: document.name.clone(),
        content_type: document.content_type.clone(),
        document_type: document.document_type.clone(),
        bytes,
    })?;

    match session.extract(extractor.as_ref(), tree).await? {
        ImportState::Review { draft } => {
            info!(
                document_id = %document_id,
                rows = draft.all_rows().count(),
                "Document extracted"
            );
            Ok(ExtractResponse {
                suggestion: ImportService::suggest_destination(tree, draft),
                draft: draft.clone(),
            })
        }
        ImportState::Failed { kind, message } => Err(ApiError(match kind {
            FailureKind::Configuration => AppError::Configuration(message.clone()),
            FailureKind::Service => AppError::ExternalService(message.clone()),
        })),
        other => Err(ApiError(AppError::Internal(format!(
            "Import ended in state {}",
            other.name()
        )))),
    }
}
