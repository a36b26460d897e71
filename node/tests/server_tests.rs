mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use serde_json::Value;
use settlement_node::errors::ChainError;
use settlement_node::server::{build_router, AppState};
use tower::ServiceExt; // for oneshot

async fn get(h: &Harness, uri: &str) -> (StatusCode, Vec<u8>) {
    let app = build_router(AppState { reader: h.reader() });
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_ok() {
    let h = harness().await;
    h.chain.with(|s| s.block_number = 42);

    let (status, body) = get(&h, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["block_number"], 42);
    assert!(json["invalid_batch_id"].is_null());
}

#[tokio::test]
async fn test_health_reports_rollback() {
    let h = harness().await;
    h.chain.with(|s| s.invalid_batch_marker = 7);

    let (status, body) = get(&h, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "rolling_back");
    assert_eq!(json["invalid_batch_id"], 7);
}

#[tokio::test]
async fn test_health_unavailable_when_node_is_down() {
    let h = harness().await;
    h.chain
        .with(|s| s.block_number_error = Some(ChainError::Transport("connection refused".into())));

    let (status, body) = get(&h, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let h = harness().await;
    let (status, _) = get(&h, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}
