// End-to-end tests for the batch upload protocol over the real router.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use bodega_server::config::{Config, DurabilityMode};
use bodega_server::routes;
use bodega_server::state::AppState;
use bodega_server::storage::LocalFsSink;
use bodega_server::upload::BATCH_SIZE;
use bodega_server::upload::UploadService;

/// Spin up the app over a filesystem sink in a temp directory.
fn test_server() -> (TestServer, TempDir) {
    let data_dir = TempDir::new().unwrap();
    let sink = Arc::new(LocalFsSink::new(data_dir.path().to_path_buf()));
    let uploads = UploadService::new(sink, DurabilityMode::BestEffort);
    let state = AppState::new(Config::default(), uploads);

    let server = TestServer::new(routes::app(state)).unwrap();
    (server, data_dir)
}

/// Records `offset..offset + count` as JSON rows.
fn records(count: u64, offset: u64) -> Vec<Value> {
    (0..count).map(|i| json!({ "row": offset + i })).collect()
}

async fn open_session(server: &TestServer, total_record: u64) -> String {
    let response = server
        .post("/api/upload/sessions")
        .json(&json!({ "totalRecord": total_record }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["sessionId"].as_str().unwrap().to_string()
}

async fn upload_batch(server: &TestServer, session_id: &str, seq_num: i64, data: Vec<Value>) {
    let response = server
        .post(&format!("/api/upload/sessions/{session_id}"))
        .json(&json!({ "seqNum": seq_num, "data": data }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_full_upload_flow_out_of_order() {
    let (server, data_dir) = test_server();
    let session_id = open_session(&server, 25_000).await;

    // 3 batches of sizes 10000, 10000, 5000, uploaded as 2, 0, 1.
    upload_batch(&server, &session_id, 2, records(5_000, 2 * BATCH_SIZE)).await;
    upload_batch(&server, &session_id, 0, records(BATCH_SIZE, 0)).await;
    upload_batch(&server, &session_id, 1, records(BATCH_SIZE, BATCH_SIZE)).await;

    let response = server
        .post(&format!("/api/upload/sessions/{session_id}/finish"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["sessionId"], json!(session_id));
    assert_eq!(body["validationResult"], json!("Success"));

    // The merged artifact landed on disk in ascending sequence order.
    let artifact = std::fs::read(data_dir.path().join(format!("{session_id}_final"))).unwrap();
    let merged: Vec<Value> = serde_json::from_slice(&artifact).unwrap();
    assert_eq!(merged.len(), 25_000);
    assert_eq!(merged[0], json!({ "row": 0 }));
    assert_eq!(merged[24_999], json!({ "row": 24_999 }));

    // The session is consumed.
    let response = server
        .post(&format!("/api/upload/sessions/{session_id}/finish"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["message"], json!("Upload session not found"));
}

#[tokio::test]
async fn test_finish_reports_missing_sequence_numbers() {
    let (server, _data_dir) = test_server();
    let session_id = open_session(&server, 20_000).await;

    upload_batch(&server, &session_id, 0, records(BATCH_SIZE, 0)).await;

    let response = server
        .post(&format!("/api/upload/sessions/{session_id}/finish"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], json!("Missing sequence numbers: 1"));

    // The session stayed open.
    let response = server
        .get(&format!("/api/upload/sessions/{session_id}"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_unexpected_sequence_number() {
    let (server, _data_dir) = test_server();
    let session_id = open_session(&server, 10_000).await;

    let response = server
        .post(&format!("/api/upload/sessions/{session_id}"))
        .json(&json!({ "seqNum": 7, "data": [1, 2, 3] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], json!("Unexpected sequence number"));
}

#[tokio::test]
async fn test_unknown_sessions_return_not_found() {
    let (server, _data_dir) = test_server();

    for path in [
        format!("/api/upload/sessions/{}", uuid::Uuid::new_v4()),
        "/api/upload/sessions/not-a-uuid".to_string(),
    ] {
        let response = server
            .post(&path)
            .json(&json!({ "seqNum": 0, "data": [] }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["message"], json!("Upload session not found"));
    }
}

#[tokio::test]
async fn test_short_batch_yields_failed_verdict() {
    let (server, _data_dir) = test_server();
    let session_id = open_session(&server, 5).await;

    // 4 records where 5 were declared.
    upload_batch(&server, &session_id, 0, records(4, 0)).await;

    let response = server
        .post(&format!("/api/upload/sessions/{session_id}/finish"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["validationResult"], json!("Failed"));
}

#[tokio::test]
async fn test_zero_record_session_finishes_immediately() {
    let (server, _data_dir) = test_server();
    let session_id = open_session(&server, 0).await;

    let response = server
        .post(&format!("/api/upload/sessions/{session_id}/finish"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["validationResult"], json!("Success"));
}

#[tokio::test]
async fn test_session_status_reports_progress() {
    let (server, _data_dir) = test_server();
    let session_id = open_session(&server, 20_000).await;

    upload_batch(&server, &session_id, 1, records(BATCH_SIZE, BATCH_SIZE)).await;

    let response = server
        .get(&format!("/api/upload/sessions/{session_id}"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["sessionId"], json!(session_id));
    assert_eq!(body["totalRecord"], json!(20_000));
    assert_eq!(body["expectedBatches"], json!(2));
    assert_eq!(body["receivedBatches"], json!(1));
    assert_eq!(body["pendingBatches"], json!(1));
    assert_eq!(body["progress"], json!(50.0));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _data_dir) = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("bodega-server"));
}
