//! S3-compatible byte-sink
//!
//! Wraps the AWS SDK for S3-compatible storage access.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::config::StorageConfig;

use super::{ByteSink, SinkError};

/// Byte-sink putting objects into an S3-compatible bucket.
pub struct S3Sink {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Sink {
    /// Create a sink from configuration and probe the bucket.
    pub async fn new(config: &StorageConfig) -> Result<Self, SinkError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or(SinkError::NotConfigured("S3_ENDPOINT"))?;
        let bucket = config
            .bucket
            .clone()
            .ok_or(SinkError::NotConfigured("S3_BUCKET"))?;
        let access_key = config
            .access_key
            .as_deref()
            .ok_or(SinkError::NotConfigured("S3_ACCESS_KEY"))?;
        let secret_key = config
            .secret_key
            .as_deref()
            .ok_or(SinkError::NotConfigured("S3_SECRET_KEY"))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "bodega");

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt writes anyway.",
                    bucket,
                    e
                );
            }
        }

        Ok(Self {
            client,
            bucket,
            prefix: config.prefix.clone(),
        })
    }

    fn object_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ByteSink for S3Sink {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SinkError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .content_type("application/json")
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| SinkError::S3(e.to_string()))?;

        Ok(())
    }
}
