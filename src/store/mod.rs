//! Remote blob store client.
//!
//! The bucket is a plain key/value service: one manifest key and N chunk keys
//! derived from a base key. Every call is an independent round trip and the
//! store offers no transactions across keys.

#[cfg(test)]
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use crate::models::Manifest;

/// Failure talking to the remote store.
#[derive(Debug)]
pub enum StoreError {
    /// Connection, timeout or body read failure
    Transport(String),
    /// The store answered with a non-success status
    Status(StatusCode),
    /// The key holds no value
    Missing(String),
    /// The manifest body was not valid JSON
    InvalidBody(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "transport error: {}", msg),
            StoreError::Status(status) => write!(f, "HTTP {}", status),
            StoreError::Missing(key) => write!(f, "key {} is empty", key),
            StoreError::InvalidBody(msg) => write!(f, "invalid body: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("Remote store request error: {:?}", err);
        StoreError::Transport(err.to_string())
    }
}

/// Operations the sync coordinator needs from the remote bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the manifest. `Ok(None)` means nothing has been published yet.
    async fn get_manifest(&self) -> Result<Option<Manifest>, StoreError>;

    async fn put_manifest(&self, manifest: &Manifest) -> Result<(), StoreError>;

    /// Fetch chunk `index`. A missing key is an error, never an empty chunk.
    async fn get_chunk(&self, index: usize) -> Result<String, StoreError>;

    async fn put_chunk(&self, index: usize, data: &str) -> Result<(), StoreError>;
}

/// Key of the manifest for `base`.
pub fn manifest_key(base: &str) -> String {
    format!("{}_manifest", base)
}

/// Key of chunk `index` for `base`.
pub fn chunk_key(base: &str, index: usize) -> String {
    format!("{}_chunk_{}", base, index)
}

/// [`BlobStore`] over HTTP GET/PUT against a kvdb-style bucket.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
}

impl HttpBlobStore {
    /// Create a client for the bucket at `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn put(&self, url: String, body: String, json: bool) -> Result<(), StoreError> {
        let mut request = self.client.put(&url).body(body);
        if json {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get_manifest(&self) -> Result<Option<Manifest>, StoreError> {
        let response = self
            .client
            .get(manifest_key(&self.base_url))
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| StoreError::InvalidBody(e.to_string()))
    }

    async fn put_manifest(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let body =
            serde_json::to_string(manifest).map_err(|e| StoreError::InvalidBody(e.to_string()))?;
        self.put(manifest_key(&self.base_url), body, true).await
    }

    async fn get_chunk(&self, index: usize) -> Result<String, StoreError> {
        let key = chunk_key(&self.base_url, index);
        let response = self
            .client
            .get(&key)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::Missing(key)),
            status if !status.is_success() => Err(StoreError::Status(status)),
            _ => Ok(response.text().await?),
        }
    }

    async fn put_chunk(&self, index: usize, data: &str) -> Result<(), StoreError> {
        self.put(chunk_key(&self.base_url, index), data.to_string(), false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation() {
        let base = "https://kvdb.io/bucket/employee_master_v7";
        assert_eq!(
            manifest_key(base),
            "https://kvdb.io/bucket/employee_master_v7_manifest"
        );
        assert_eq!(
            chunk_key(base, 0),
            "https://kvdb.io/bucket/employee_master_v7_chunk_0"
        );
        assert_eq!(
            chunk_key(base, 12),
            "https://kvdb.io/bucket/employee_master_v7_chunk_12"
        );
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::Status(StatusCode::INTERNAL_SERVER_ERROR).to_string(),
            "HTTP 500 Internal Server Error"
        );
        assert_eq!(
            StoreError::Missing("k_chunk_1".into()).to_string(),
            "key k_chunk_1 is empty"
        );
    }
}
