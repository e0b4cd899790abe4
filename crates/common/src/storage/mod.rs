//! Object storage for staging the corpus file
//!
//! The search backend imports the corpus from a storage location, so
//! ingestion first uploads the rendered blob and passes the returned
//! locator on.

use crate::backend::FILE_SCHEME;
use crate::config::{AppConfig, StorageProvider};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Trait for putting a named object and getting back its location
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning a location URI the backend can import
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Google Cloud Storage client (JSON API, simple media upload)
pub struct GcsObjectStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

impl GcsObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        access_token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            bucket: bucket.into(),
            access_token,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.storage_api_base(),
            config.storage_bucket()?,
            config.backend.access_token.clone(),
            config.backend_timeout(),
        )
    }

    /// `gs://` URI of an object in this bucket
    pub fn location(&self, key: &str) -> String {
        format!("gs://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, self.bucket);
        let size = bytes.len();

        let mut request = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", key)])
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(bytes);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| AppError::Storage {
            message: format!("Upload failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage {
                message: format!("API error {}: {}", status, body),
            });
        }

        let location = self.location(key);
        debug!(location = %location, size, "Object uploaded");
        Ok(location)
    }
}

/// Object store backed by a local directory, returning `file://` URIs
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let storage_err = |e: std::io::Error| AppError::Storage {
            message: format!("Failed to write {}: {}", key, e),
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(storage_err)?;
        let path = self.root.join(key);
        tokio::fs::write(&path, bytes).await.map_err(storage_err)?;

        let absolute = tokio::fs::canonicalize(&path).await.map_err(storage_err)?;
        Ok(format!("{}{}", FILE_SCHEME, absolute.display()))
    }
}

/// Create the configured object store
pub fn create_object_store(config: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.storage.provider {
        StorageProvider::Gcs => Ok(Arc::new(GcsObjectStore::from_config(config)?)),
        StorageProvider::Local => Ok(Arc::new(LocalObjectStore::new(
            config.storage.local_dir.clone(),
        ))),
    }
}
