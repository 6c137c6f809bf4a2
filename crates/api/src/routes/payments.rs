//! Payment request routes.
//!
//! Each decision route reads the current status, asks the workflow for the
//! action and hands it to the store, all under one write lock.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use grantwise_core::payment::{
    NewPaymentRequest, PaymentAction, PaymentError, PaymentRequest, PaymentStatus, PaymentWorkflow,
};
use grantwise_shared::types::{GrantId, PaymentRequestId, UserId};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Creates the payment request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payment-requests",
            get(list_payment_requests).post(create_payment_request),
        )
        .route("/payment-requests/{request_id}", get(get_payment_request))
        .route("/payment-requests/{request_id}/approve", post(approve))
        .route("/payment-requests/{request_id}/reject", post(reject))
        .route("/payment-requests/{request_id}/resubmit", post(resubmit))
        .route("/payment-requests/{request_id}/pay", post(mark_paid))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing payment requests.
#[derive(Debug, Deserialize)]
pub struct ListPaymentRequestsQuery {
    /// Only requests against this grant.
    pub grant_id: Option<GrantId>,
    /// Only requests in this status.
    pub status: Option<PaymentStatus>,
}

/// Request body for approving.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// Approver.
    pub approved_by: UserId,
    /// Optional decision notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for rejecting.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reviewer.
    pub rejected_by: UserId,
    /// Why the request was rejected.
    pub reason: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/payment-requests`
async fn list_payment_requests(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentRequestsQuery>,
) -> Json<Vec<PaymentRequest>> {
    let store = state.store.read().await;
    Json(
        store
            .payment_requests(query.grant_id, query.status)
            .cloned()
            .collect(),
    )
}

/// POST `/payment-requests`
async fn create_payment_request(
    State(state): State<AppState>,
    Json(payload): Json<NewPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .mutate(|store| Ok(store.add_payment_request(payload)?.clone()))
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET `/payment-requests/{request_id}`
async fn get_payment_request(
    State(state): State<AppState>,
    Path(request_id): Path<PaymentRequestId>,
) -> Result<Json<PaymentRequest>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.payment_request(request_id)?.clone()))
}

/// POST `/payment-requests/{request_id}/approve`
async fn approve(
    State(state): State<AppState>,
    Path(request_id): Path<PaymentRequestId>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<PaymentRequest>, ApiError> {
    transition(&state, request_id, |status| {
        PaymentWorkflow::approve(status, payload.approved_by, payload.notes)
    })
    .await
}

/// POST `/payment-requests/{request_id}/reject`
async fn reject(
    State(state): State<AppState>,
    Path(request_id): Path<PaymentRequestId>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<PaymentRequest>, ApiError> {
    transition(&state, request_id, |status| {
        PaymentWorkflow::reject(status, payload.rejected_by, payload.reason)
    })
    .await
}

/// POST `/payment-requests/{request_id}/resubmit`
async fn resubmit(
    State(state): State<AppState>,
    Path(request_id): Path<PaymentRequestId>,
) -> Result<Json<PaymentRequest>, ApiError> {
    transition(&state, request_id, PaymentWorkflow::resubmit).await
}

/// POST `/payment-requests/{request_id}/pay` - Records the expense when a mini-pool is named.
async fn mark_paid(
    State(state): State<AppState>,
    Path(request_id): Path<PaymentRequestId>,
) -> Result<Json<PaymentRequest>, ApiError> {
    transition(&state, request_id, PaymentWorkflow::mark_paid).await
}

async fn transition<F>(
    state: &AppState,
    request_id: PaymentRequestId,
    decide: F,
) -> Result<Json<PaymentRequest>, ApiError>
where
    F: FnOnce(PaymentStatus) -> Result<PaymentAction, PaymentError>,
{
    let request = state
        .mutate(|store| {
            let status = store.payment_request(request_id)?.status;
            let action = decide(status)?;
            Ok(store.update_payment_request(request_id, action)?.clone())
        })
        .await?;
    Ok(Json(request))
}
