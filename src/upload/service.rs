//! Upload Service
//!
//! Batch ingest and finalization on top of the session registry. Integrity
//! state (pending set, batch list, digests) is mutated under the per-session
//! lock; byte-sink writes always happen with the lock released. What a write
//! failure means is decided by the configured durability mode: `BestEffort`
//! logs and keeps the in-memory copy authoritative, `Required` surfaces the
//! failure to the caller and leaves the session retryable.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::DurabilityMode;
use crate::storage::ByteSink;

use super::digest;
use super::registry::SessionRegistry;
use super::types::{ReceivedBatch, UploadError, UploadSession, Verdict};

/// Outcome of a committed finish call.
#[derive(Debug, Clone, Copy)]
pub struct FinishOutcome {
    pub session_id: Uuid,
    pub verdict: Verdict,
}

/// The upload engine shared across request handlers.
#[derive(Clone)]
pub struct UploadService {
    inner: Arc<UploadServiceInner>,
}

struct UploadServiceInner {
    registry: SessionRegistry,
    sink: Arc<dyn ByteSink>,
    durability: DurabilityMode,
}

fn batch_key(session_id: &Uuid, seq_num: u64) -> String {
    format!("{session_id}_batch{seq_num}")
}

fn artifact_key(session_id: &Uuid) -> String {
    format!("{session_id}_final")
}

impl UploadService {
    /// Create a service writing through the given byte-sink.
    pub fn new(sink: Arc<dyn ByteSink>, durability: DurabilityMode) -> Self {
        Self {
            inner: Arc::new(UploadServiceInner {
                registry: SessionRegistry::new(),
                sink,
                durability,
            }),
        }
    }

    /// Open a new upload session and return its ID.
    pub async fn create_session(&self, total_records: u64) -> Uuid {
        let id = self.inner.registry.create(total_records).await;

        tracing::info!(
            session_id = %id,
            total_records = total_records,
            "Created upload session"
        );

        id
    }

    /// Look up a session handle for read-only inspection.
    pub async fn lookup(&self, session_id: &str) -> Result<Arc<Mutex<UploadSession>>, UploadError> {
        self.inner.registry.get_by_str(session_id).await
    }

    /// Accept one batch for a session.
    ///
    /// The sequence number must still be pending; out-of-range, negative and
    /// already-consumed numbers are all rejected as unexpected with state
    /// unchanged. On acceptance the payload digest is recorded and the raw
    /// payload bytes are handed to the byte-sink.
    pub async fn ingest_batch(
        &self,
        session_id: &str,
        seq_num: i64,
        records: Vec<Value>,
    ) -> Result<(), UploadError> {
        let handle = self.inner.registry.get_by_str(session_id).await?;

        let payload = serde_json::to_vec(&records)
            .map_err(|e| UploadError::Internal(format!("failed to serialize payload: {e}")))?;
        let digest = digest::compute(&payload);

        let (id, seq) = {
            let mut session = handle.lock().await;

            if session.closed {
                return Err(UploadError::SessionNotFound);
            }

            let seq = u64::try_from(seq_num)
                .map_err(|_| UploadError::UnexpectedSequenceNumber(seq_num))?;
            if !session.pending.remove(&seq) {
                return Err(UploadError::UnexpectedSequenceNumber(seq_num));
            }

            session.batches.push(ReceivedBatch {
                seq_num: seq,
                records,
                digest,
            });

            tracing::debug!(
                session_id = %session.id,
                seq_num = seq,
                received = session.batches.len(),
                expected = session.expected_batches,
                "Accepted batch"
            );

            (session.id, seq)
        };

        if let Err(err) = self.inner.sink.write(&batch_key(&id, seq), &payload).await {
            match self.inner.durability {
                DurabilityMode::BestEffort => {
                    tracing::warn!(
                        session_id = %id,
                        seq_num = seq,
                        error = %err,
                        "Batch persistence failed, in-memory copy remains authoritative"
                    );
                }
                DurabilityMode::Required => {
                    // Roll the acceptance back so the client can retry the
                    // same sequence number.
                    let mut session = handle.lock().await;
                    if !session.closed {
                        session.pending.insert(seq);
                        session.batches.retain(|b| b.seq_num != seq);
                    }
                    return Err(UploadError::Storage(err.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Finalize a session.
    ///
    /// Reports the full missing list while batches are outstanding. Once all
    /// batches are present, re-validates every digest and merges the records
    /// in ascending sequence order; both verdicts are terminal and retire the
    /// session. An integrity failure aborts the merge and leaves the session
    /// open for re-upload.
    pub async fn finish(&self, session_id: &str) -> Result<FinishOutcome, UploadError> {
        let handle = self.inner.registry.get_by_str(session_id).await?;
        let retire_on_merge = matches!(self.inner.durability, DurabilityMode::BestEffort);

        let (id, verdict, artifact) = {
            let mut session = handle.lock().await;

            if session.closed {
                return Err(UploadError::SessionNotFound);
            }

            if !session.is_finalizable() {
                return Err(UploadError::MissingBatches(session.missing_batches()));
            }

            let (merged, verdict) = merge_batches(&session)?;
            let artifact = serde_json::to_vec(&merged)
                .map_err(|e| UploadError::Internal(format!("failed to serialize artifact: {e}")))?;

            tracing::info!(
                session_id = %session.id,
                batches = session.batches.len(),
                merged_records = merged.len(),
                total_records = session.total_records,
                verdict = ?verdict,
                "Merged upload session"
            );

            if retire_on_merge {
                session.closed = true;
            }

            (session.id, verdict, artifact)
        };

        match self.inner.durability {
            DurabilityMode::BestEffort => {
                self.inner.registry.remove(&id).await;

                if let Err(err) = self.inner.sink.write(&artifact_key(&id), &artifact).await {
                    tracing::warn!(
                        session_id = %id,
                        error = %err,
                        "Artifact persistence failed, verdict already computed"
                    );
                }
            }
            DurabilityMode::Required => {
                // Persist before retiring so a failed write leaves the
                // session open and finish can be retried.
                self.inner
                    .sink
                    .write(&artifact_key(&id), &artifact)
                    .await
                    .map_err(|err| UploadError::Storage(err.to_string()))?;

                let newly_closed = {
                    let mut session = handle.lock().await;
                    if session.closed {
                        false
                    } else {
                        session.closed = true;
                        true
                    }
                };
                if newly_closed {
                    self.inner.registry.remove(&id).await;
                }
            }
        }

        Ok(FinishOutcome {
            session_id: id,
            verdict,
        })
    }
}

/// Re-validate every batch digest and concatenate the records in ascending
/// sequence order. Requires an empty pending set, which makes the sequence
/// numbers exactly the dense range `0..expected_batches`.
fn merge_batches(session: &UploadSession) -> Result<(Vec<Value>, Verdict), UploadError> {
    let expected = usize::try_from(session.expected_batches)
        .map_err(|_| UploadError::Internal("batch count exceeds addressable range".into()))?;

    let mut ordered: Vec<Option<&ReceivedBatch>> = vec![None; expected];
    for batch in &session.batches {
        if let Some(slot) = ordered.get_mut(batch.seq_num as usize) {
            *slot = Some(batch);
        }
    }

    let mut merged = Vec::new();
    for slot in ordered {
        let batch = slot.ok_or_else(|| {
            UploadError::Internal("received batches out of sync with pending set".into())
        })?;

        let payload = serde_json::to_vec(&batch.records)
            .map_err(|e| UploadError::Internal(format!("failed to serialize payload: {e}")))?;
        if !digest::verify(&payload, &batch.digest) {
            return Err(UploadError::IntegrityCheckFailed);
        }

        merged.extend(batch.records.iter().cloned());
    }

    let verdict = if merged.len() as u64 == session.total_records {
        Verdict::Success
    } else {
        Verdict::Failed
    };

    Ok((merged, verdict))
}

// ============================================================================
// Tests
// ============================================================================
