//! Local filesystem byte-sink
//!
//! Flat files under a configurable data directory, created on first write.

use std::path::PathBuf;

use super::{ByteSink, SinkError};

/// Byte-sink writing flat files under `base_dir`.
pub struct LocalFsSink {
    base_dir: PathBuf,
}

impl LocalFsSink {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

#[async_trait::async_trait]
impl ByteSink for LocalFsSink {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::write(self.base_dir.join(key), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_write_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = LocalFsSink::new(temp_dir.path().join("upload-data"));

        sink.write("abc_batch0", b"[1,2,3]").await.unwrap();

        let stored = tokio::fs::read(temp_dir.path().join("upload-data").join("abc_batch0"))
            .await
            .unwrap();
        assert_eq!(stored, b"[1,2,3]");
    }

    #[tokio::test]
    async fn test_write_replaces_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let sink = LocalFsSink::new(temp_dir.path().to_path_buf());

        sink.write("abc_final", b"old").await.unwrap();
        sink.write("abc_final", b"new").await.unwrap();

        let stored = tokio::fs::read(temp_dir.path().join("abc_final")).await.unwrap();
        assert_eq!(stored, b"new");
    }
}
