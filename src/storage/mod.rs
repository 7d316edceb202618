//! Storage module: the byte-sink the upload core writes through
//!
//! Batch payloads and final artifacts are handed to a `ByteSink` keyed by
//! opaque strings. Backends cover the local filesystem and S3-compatible
//! object stores (MinIO, Cloudflare R2, Backblaze B2, AWS S3).

use std::sync::Arc;

use crate::config::{StorageConfig, StorageProvider};

mod local;
mod s3;

pub use local::LocalFsSink;
pub use s3::S3Sink;

/// Byte-sink failure. Never fatal to upload callers; the durability mode
/// decides whether it surfaces.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("s3 error: {0}")]
    S3(String),

    #[error("storage not configured: {0}")]
    NotConfigured(&'static str),
}

/// Durable-storage collaborator for batch and artifact bytes.
#[async_trait::async_trait]
pub trait ByteSink: Send + Sync {
    /// Write `bytes` under `key`, replacing any previous value.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Build the configured byte-sink backend.
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn ByteSink>, SinkError> {
    match config.provider {
        StorageProvider::Local => Ok(Arc::new(LocalFsSink::new(config.data_dir.clone()))),
        _ => Ok(Arc::new(S3Sink::new(config).await?)),
    }
}
