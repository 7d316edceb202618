//! Upload Routes
//!
//! HTTP endpoints for the batch upload protocol.
//!
//! Endpoints:
//! - POST /api/upload/sessions - Open a session
//! - POST /api/upload/sessions/:session_id - Upload one batch
//! - GET /api/upload/sessions/:session_id - Session progress
//! - POST /api/upload/sessions/:session_id/finish - Merge and close

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::state::AppState;
use crate::upload::{
    CreateSessionRequest, CreateSessionResponse, FinishResponse, IngestBatchRequest, UploadError,
};

// ============================================================================
// Error Response
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Upload request failed");
        }

        let body = Json(ErrorResponse {
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the upload router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", post(ingest_batch).get(session_status))
        .route("/sessions/:session_id/finish", post(finish))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/upload/sessions
///
/// Open an upload session for the declared record total.
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Json<CreateSessionResponse> {
    let session_id = state.uploads().create_session(request.total_record).await;

    Json(CreateSessionResponse {
        session_id: session_id.to_string(),
    })
}

/// POST /api/upload/sessions/:session_id
///
/// Upload one batch. Replies with an empty 204 on acceptance.
async fn ingest_batch(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<IngestBatchRequest>,
) -> Result<StatusCode, UploadError> {
    state
        .uploads()
        .ingest_batch(&session_id, request.seq_num, request.data)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/upload/sessions/:session_id/finish
///
/// Merge the accumulated batches and return the verdict, or report what is
/// still missing.
async fn finish(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FinishResponse>, UploadError> {
    let outcome = state.uploads().finish(&session_id).await?;

    Ok(Json(FinishResponse {
        session_id: outcome.session_id.to_string(),
        validation_result: outcome.verdict,
    }))
}

/// GET /api/upload/sessions/:session_id
///
/// Read-only progress view of an open session.
async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>, UploadError> {
    let handle = state.uploads().lookup(&session_id).await?;
    let session = handle.lock().await;

    if session.closed {
        return Err(UploadError::SessionNotFound);
    }

    Ok(Json(SessionStatusResponse {
        session_id: session.id.to_string(),
        total_record: session.total_records,
        expected_batches: session.expected_batches,
        received_batches: session.batches.len() as u64,
        pending_batches: session.pending.len() as u64,
        progress: session.progress(),
        created_at: session.created_at,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStatusResponse {
    session_id: String,
    total_record: u64,
    expected_batches: u64,
    received_batches: u64,
    pending_batches: u64,
    progress: f64,
    created_at: chrono::DateTime<chrono::Utc>,
}
