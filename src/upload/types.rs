//! Upload types for the batch upload protocol

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Records per batch. Every batch carries exactly this many records except
/// the last one, which may hold the remainder.
pub const BATCH_SIZE: u64 = 10_000;

// ============================================================================
// Session Types
// ============================================================================

/// Server-side state for one upload in progress.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Unique session ID
    pub id: Uuid,

    /// Total number of logical records the client declared
    pub total_records: u64,

    /// Number of batches expected: ceil(total_records / BATCH_SIZE)
    pub expected_batches: u64,

    /// Sequence numbers not yet received. Seeded with 0..expected_batches and
    /// shrinking monotonically; ordered iteration yields the missing list.
    pub pending: BTreeSet<u64>,

    /// Accepted batches in arrival order, one entry per sequence number
    pub batches: Vec<ReceivedBatch>,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Set once a finish merge has committed. A closed session behaves as
    /// absent for every operation.
    pub closed: bool,
}

impl UploadSession {
    /// Create a new session expecting `ceil(total_records / BATCH_SIZE)` batches.
    pub fn new(total_records: u64) -> Self {
        let expected_batches = total_records.div_ceil(BATCH_SIZE);

        Self {
            id: Uuid::new_v4(),
            total_records,
            expected_batches,
            pending: (0..expected_batches).collect(),
            batches: Vec::new(),
            created_at: Utc::now(),
            closed: false,
        }
    }

    /// A session is finalizable once every expected batch has arrived.
    pub fn is_finalizable(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sequence numbers still outstanding, in ascending order.
    pub fn missing_batches(&self) -> Vec<u64> {
        self.pending.iter().copied().collect()
    }

    /// Progress percentage by batch count.
    pub fn progress(&self) -> f64 {
        if self.expected_batches == 0 {
            return 100.0;
        }
        (self.batches.len() as f64 / self.expected_batches as f64) * 100.0
    }
}

/// One accepted batch together with the digest computed at ingest time.
#[derive(Debug, Clone)]
pub struct ReceivedBatch {
    /// Zero-based position among expected batches
    pub seq_num: u64,

    /// The record payload exactly as received
    pub records: Vec<Value>,

    /// Fingerprint of the serialized payload, re-checked at finalize
    pub digest: String,
}

/// Final outcome of a completed merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Merged record count matches the declared total
    Success,
    /// Merge completed but the record count does not match
    Failed,
}

// ============================================================================
// Wire Types
// ============================================================================

/// Request to open an upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Total number of logical records across all batches
    pub total_record: u64,
}

/// Response to session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// One uploaded batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestBatchRequest {
    /// Zero-based sequence number. Signed on the wire so that negative
    /// values are rejected as unexpected rather than failing to parse.
    pub seq_num: i64,

    /// Ordered record payload
    pub data: Vec<Value>,
}

/// Response to a finish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub session_id: String,
    pub validation_result: Verdict,
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error taxonomy. Every variant is a recoverable client-facing
/// condition; the display text is surfaced verbatim in the response body.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload session not found")]
    SessionNotFound,

    #[error("Unexpected sequence number")]
    UnexpectedSequenceNumber(i64),

    #[error("Missing sequence numbers: {}", fmt_seq_list(.0))]
    MissingBatches(Vec<u64>),

    #[error("Data integrity check failed")]
    IntegrityCheckFailed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::UnexpectedSequenceNumber(_) => StatusCode::BAD_REQUEST,
            Self::MissingBatches(_) => StatusCode::BAD_REQUEST,
            Self::IntegrityCheckFailed => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn fmt_seq_list(seq_nums: &[u64]) -> String {
    seq_nums
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Tests
// ============================================================================
