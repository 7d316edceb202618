//! Configuration management for Bodega Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub data_dir: PathBuf,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    Minio,
    R2,
    S3,
    B2,
}

/// What a byte-sink write failure means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurabilityMode {
    /// Log the failure and keep going; the in-memory copy stays authoritative.
    BestEffort,
    /// Surface the failure to the client and keep the operation retryable.
    Required,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub durability: DurabilityMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                provider: StorageProvider::Local,
                data_dir: PathBuf::from("./upload-data"),
                endpoint: None,
                bucket: None,
                access_key: None,
                secret_key: None,
                region: None,
                prefix: None,
            },
            upload: UploadConfig {
                durability: DurabilityMode::BestEffort,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let provider = parse_provider(
            &env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "local".to_string()),
        );

        // S3 credentials are only required when an object-store provider is
        // selected; the local backend needs none of them.
        let (endpoint, bucket, access_key, secret_key) = match provider {
            StorageProvider::Local => (None, None, None, None),
            _ => (
                Some(env::var("S3_ENDPOINT")?),
                Some(env::var("S3_BUCKET")?),
                Some(env::var("S3_ACCESS_KEY")?),
                Some(env::var("S3_SECRET_KEY")?),
            ),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            storage: StorageConfig {
                provider,
                data_dir: env::var("UPLOAD_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./upload-data")),
                endpoint,
                bucket,
                access_key,
                secret_key,
                region: env::var("S3_REGION").ok(),
                prefix: env::var("S3_PREFIX").ok(),
            },
            upload: UploadConfig {
                durability: parse_durability(
                    &env::var("DURABILITY_MODE").unwrap_or_else(|_| "best-effort".to_string()),
                ),
            },
        })
    }
}

fn parse_provider(value: &str) -> StorageProvider {
    match value {
        "minio" => StorageProvider::Minio,
        "r2" => StorageProvider::R2,
        "s3" => StorageProvider::S3,
        "b2" => StorageProvider::B2,
        _ => StorageProvider::Local,
    }
}

fn parse_durability(value: &str) -> DurabilityMode {
    match value {
        "required" => DurabilityMode::Required,
        _ => DurabilityMode::BestEffort,
    }
}
