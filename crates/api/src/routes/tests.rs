use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use grantwise_core::extraction::{
    ExpenseExtractor, ExtractedItem, ExtractionError, ExtractionResult, SourceDocument,
};
use grantwise_core::storage::DocumentStorage;
use grantwise_store::EntityStore;
use http_body_util::BodyExt;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, create_router};

/// Returns three travel items for any document.
struct StubExtractor;

#[async_trait]
impl ExpenseExtractor for StubExtractor {
    async fn extract(
        &self,
        _document: &SourceDocument,
        _budget_context: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let item = |name: &str, amount: Decimal| ExtractedItem {
            name: Some(name.into()),
            amount: Some(amount),
            suggested_category: Some("Travel".into()),
            spent: Some(true),
            ..ExtractedItem::default()
        };
        Ok(ExtractionResult {
            document_type: Some("invoice".into()),
            items: vec![
                item("Flight", dec!(400)),
                item("Hotel", dec!(250)),
                item("Taxi", dec!(50)),
            ],
            ..ExtractionResult::default()
        })
    }
}

fn app(extractor: bool) -> Router {
    let storage = DocumentStorage::in_memory().unwrap();
    let mut state = AppState::new(EntityStore::new(), storage);
    if extractor {
        state = state.with_extractor(Arc::new(StubExtractor));
    }
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn amount(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap()
}

fn id(value: &Value) -> String {
    value.as_str().unwrap().to_string()
}

/// Grant with a 1000 budget, one category and one mini-pool.
async fn seed_budget(app: &Router) -> (String, String, String) {
    let (_, grant) = send(app, "POST", "/api/v1/grants", Some(json!({"title": "Clinic"}))).await;
    let grant_id = id(&grant["id"]);
    let (_, budget) = send(
        app,
        "POST",
        "/api/v1/budgets",
        Some(json!({"grant_id": grant_id, "total_budget": "1000", "fiscal_year": "2025"})),
    )
    .await;
    let budget_id = id(&budget["id"]);
    let (_, budget) = send(
        app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/categories"),
        Some(json!({"name": "Supplies", "allocated": "1000"})),
    )
    .await;
    let category_id = id(&budget["categories"][0]["id"]);
    let (_, budget) = send(
        app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/categories/{category_id}/mini-pools"),
        Some(json!({"description": "Lab", "allocated": "1000"})),
    )
    .await;
    let mini_pool_id = id(&budget["categories"][0]["mini_pools"][0]["id"]);
    (grant_id, budget_id, mini_pool_id)
}

#[tokio::test]
async fn test_health() {
    let app = app(false);
    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["extraction"], false);
}

#[tokio::test]
async fn test_grant_list_is_paginated() {
    let app = app(false);
    for title in ["A", "B", "C"] {
        let (status, _) = send(&app, "POST", "/api/v1/grants", Some(json!({"title": title}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/v1/grants?page=2&per_page=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "C");
}

#[tokio::test]
async fn test_blank_grant_title_is_rejected() {
    let app = app(false);
    let (status, body) = send(&app, "POST", "/api/v1/grants", Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[rstest]
#[case("grants")]
#[case("budgets")]
#[case("documents")]
#[case("payment-requests")]
#[case("templates")]
#[tokio::test]
async fn test_unknown_id_is_404(#[case] collection: &str) {
    let app = app(false);
    let uri = format!("/api/v1/{collection}/{}", uuid::Uuid::now_v7());
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_summary_separates_spent_and_planned() {
    let app = app(false);
    let (_, budget_id, mini_pool_id) = seed_budget(&app).await;
    let expenses = format!("/api/v1/budgets/{budget_id}/mini-pools/{mini_pool_id}/expenses");
    send(
        &app,
        "POST",
        &expenses,
        Some(json!({"description": "Gloves", "amount": "300", "status": "spent"})),
    )
    .await;
    let (_, budget) = send(
        &app,
        "POST",
        &expenses,
        Some(json!({"description": "Reagents", "amount": "200", "status": "planned"})),
    )
    .await;

    let (_, summary) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}/summary"), None).await;
    assert_eq!(amount(&summary["summary"]["spent"]), dec!(300));
    assert_eq!(amount(&summary["summary"]["remaining"]), dec!(700));
    assert_eq!(amount(&summary["summary"]["percent_used"]), dec!(30));
    assert_eq!(summary["summary"]["is_over_budget"], false);

    let planned_id = id(&budget["categories"][0]["mini_pools"][0]["expenses"][1]["id"]);
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/budgets/{budget_id}/expenses/{planned_id}/status"),
        Some(json!({"status": "spent"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, summary) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}/summary"), None).await;
    assert_eq!(amount(&summary["summary"]["spent"]), dec!(500));
}

#[tokio::test]
async fn test_expense_without_amount_is_rejected() {
    let app = app(false);
    let (_, budget_id, mini_pool_id) = seed_budget(&app).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/mini-pools/{mini_pool_id}/expenses"),
        Some(json!({"description": "Gloves"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_request_paid_records_expense() {
    let app = app(false);
    let (grant_id, budget_id, mini_pool_id) = seed_budget(&app).await;
    let user = uuid::Uuid::now_v7();

    let (status, request) = send(
        &app,
        "POST",
        "/api/v1/payment-requests",
        Some(json!({
            "grant_id": grant_id,
            "budget_id": budget_id,
            "mini_pool_id": mini_pool_id,
            "payee": "Acme Labs",
            "description": "Centrifuge service",
            "amount": "120",
            "requested_by": user,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = id(&request["id"]);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/payment-requests/{request_id}/pay"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "POST",
        &format!("/api/v1/payment-requests/{request_id}/approve"),
        Some(json!({"approved_by": user})),
    )
    .await;
    let (status, paid) = send(
        &app,
        "POST",
        &format!("/api/v1/payment-requests/{request_id}/pay"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert!(paid["expense_id"].is_string());

    let (_, summary) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}/summary"), None).await;
    assert_eq!(amount(&summary["summary"]["spent"]), dec!(120));
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let app = app(false);
    let (grant_id, budget_id, _) = seed_budget(&app).await;
    let user = uuid::Uuid::now_v7();
    let (_, request) = send(
        &app,
        "POST",
        "/api/v1/payment-requests",
        Some(json!({
            "grant_id": grant_id,
            "budget_id": budget_id,
            "payee": "Acme Labs",
            "description": "",
            "amount": "10",
            "requested_by": user,
        })),
    )
    .await;
    let uri = format!("/api/v1/payment-requests/{}/reject", id(&request["id"]));

    let (status, _) = send(&app, "POST", &uri, Some(json!({"rejected_by": user, "reason": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"rejected_by": user, "reason": "No quote attached"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "No quote attached");
}

#[tokio::test]
async fn test_extract_without_extractor_is_503() {
    let app = app(false);
    let (_, budget_id, _) = seed_budget(&app).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/imports/extract"),
        Some(json!({"document_id": uuid::Uuid::now_v7()})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_upload_extract_and_apply_flat_import() {
    let app = app(true);
    let (grant_id, budget_id, _) = seed_budget(&app).await;

    let upload = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/documents?name=invoice.pdf&grant_id={grant_id}"))
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from("%PDF-1.7"))
        .unwrap();
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let document: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(document["size_bytes"], 8);

    let (status, extracted) = send(
        &app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/imports/extract"),
        Some(json!({"document_id": document["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extracted["draft"]["rows"].as_array().unwrap().len(), 3);
    assert_eq!(extracted["suggestion"]["destination"]["layout"], "flat");

    let (status, applied) = send(
        &app,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/imports/apply"),
        Some(json!({
            "draft": extracted["draft"],
            "destination": extracted["suggestion"]["destination"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied["outcome"]["created_expenses"].as_array().unwrap().len(), 3);
    assert_eq!(amount(&applied["outcome"]["total_imported"]), dec!(700));

    let travel = applied["budget"]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Travel")
        .unwrap();
    assert_eq!(amount(&travel["allocated"]), dec!(700));
    let notes: Vec<&Value> = travel["mini_pools"][0]["expenses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["notes"])
        .collect();
    assert!(notes.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_failed_snapshot_write_keeps_nothing() {
    let state = AppState::new(EntityStore::new(), DocumentStorage::in_memory().unwrap());
    let app = create_router(state.clone());
    let (_, budget_id, mini_pool_id) = seed_budget(&app).await;

    // A regular file where the snapshot directory should be.
    let blocker = std::env::temp_dir().join(format!("grantwise-blocker-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();
    let failing = create_router(state.with_snapshot_path(blocker.join("grantwise.json")));

    let (status, _) = send(
        &failing,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/imports/apply"),
        Some(json!({
            "draft": {
                "layout": "flat",
                "rows": [
                    {"name": "Flight", "amount": "400", "selected": true, "status": "spent"}
                ]
            },
            "destination": {
                "layout": "flat",
                "target": {
                    "category": {"kind": "new", "name": "Travel"},
                    "mini_pool": {"kind": "new", "description": "Trips"}
                }
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(
        &failing,
        "POST",
        &format!("/api/v1/budgets/{budget_id}/mini-pools/{mini_pool_id}/expenses"),
        Some(json!({"description": "Gloves", "amount": "20"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, budget) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}"), None).await;
    let categories = budget["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert!(
        categories[0]["mini_pools"][0]["expenses"]
            .as_array()
            .unwrap()
            .is_empty()
    );

    std::fs::remove_file(&blocker).unwrap();
}

#[tokio::test]
async fn test_budget_update_with_repeated_ids_is_rejected() {
    let app = app(false);
    let (_, budget_id, _) = seed_budget(&app).await;
    let (_, budget) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}"), None).await;
    let category = budget["categories"][0].clone();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/budgets/{budget_id}"),
        Some(json!({"categories": [category.clone(), category]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let (_, summary) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}/summary"), None).await;
    assert_eq!(amount(&summary["allocated"]), dec!(1000));
}

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let app = app(false);
    let upload = Request::builder()
        .method("POST")
        .uri("/api/v1/documents?name=run.exe")
        .header(header::CONTENT_TYPE, "application/x-msdownload")
        .body(Body::from("MZ"))
        .unwrap();
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, documents) = send(&app, "GET", "/api/v1/documents", None).await;
    assert!(documents.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_grant_cascades() {
    let app = app(false);
    let (grant_id, budget_id, _) = seed_budget(&app).await;
    send(
        &app,
        "POST",
        "/api/v1/tasks",
        Some(json!({"title": "Order reagents", "grant_id": grant_id})),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/grants/{grant_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["budgets"], 1);
    assert_eq!(body["tasks"], 1);

    let (status, _) = send(&app, "GET", &format!("/api/v1/budgets/{budget_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_lifecycle() {
    let app = app(false);
    let (status, template) = send(
        &app,
        "POST",
        "/api/v1/templates",
        Some(json!({"name": "Progress report", "body": "Aims met: {{aims}}"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/v1/templates/{}", id(&template["id"]));

    let (_, updated) = send(&app, "PUT", &uri, Some(json!({"category": "reports"}))).await;
    assert_eq!(updated["category"], "reports");

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
