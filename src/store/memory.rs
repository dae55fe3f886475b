//! In-memory [`BlobStore`] with failure injection, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{BlobStore, StoreError};
use crate::models::Manifest;

#[derive(Default)]
struct Inner {
    manifest: Option<Manifest>,
    chunks: HashMap<usize, String>,
    fail_get_manifest: bool,
    fail_put_manifest: bool,
    fail_get_chunks: HashSet<usize>,
    fail_put_chunks: HashSet<usize>,
    chunk_puts: Vec<usize>,
    manifest_puts: usize,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
    put_delay: Option<Duration>,
    get_delay: Option<Duration>,
    gets_in_flight: AtomicUsize,
    max_gets_in_flight: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_put_delay(delay: Duration) -> Self {
        Self {
            put_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_get_delay(delay: Duration) -> Self {
        Self {
            get_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Highest number of chunk GETs seen running at once.
    pub fn max_gets_in_flight(&self) -> usize {
        self.max_gets_in_flight.load(Ordering::SeqCst)
    }

    fn read_chunk(&self, index: usize) -> Result<String, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_get_chunks.contains(&index) {
            return Err(StoreError::Transport("timed out".into()));
        }
        inner
            .chunks
            .get(&index)
            .cloned()
            .ok_or_else(|| StoreError::Missing(format!("chunk_{}", index)))
    }

    pub fn manifest(&self) -> Option<Manifest> {
        self.inner.lock().unwrap().manifest.clone()
    }

    pub fn set_manifest(&self, manifest: Option<Manifest>) {
        self.inner.lock().unwrap().manifest = manifest;
    }

    pub fn set_chunk(&self, index: usize, data: &str) {
        self.inner.lock().unwrap().chunks.insert(index, data.to_string());
    }

    pub fn fail_get_manifest(&self, fail: bool) {
        self.inner.lock().unwrap().fail_get_manifest = fail;
    }

    pub fn fail_put_manifest(&self, fail: bool) {
        self.inner.lock().unwrap().fail_put_manifest = fail;
    }

    pub fn fail_get_chunk(&self, index: usize) {
        self.inner.lock().unwrap().fail_get_chunks.insert(index);
    }

    pub fn fail_put_chunk(&self, index: usize) {
        self.inner.lock().unwrap().fail_put_chunks.insert(index);
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_get_manifest = false;
        inner.fail_put_manifest = false;
        inner.fail_get_chunks.clear();
        inner.fail_put_chunks.clear();
    }

    /// Chunk indices in the order they were uploaded.
    pub fn chunk_puts(&self) -> Vec<usize> {
        self.inner.lock().unwrap().chunk_puts.clone()
    }

    pub fn manifest_puts(&self) -> usize {
        self.inner.lock().unwrap().manifest_puts
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_manifest(&self) -> Result<Option<Manifest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_get_manifest {
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(inner.manifest.clone())
    }

    async fn put_manifest(&self, manifest: &Manifest) -> Result<(), StoreError> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_put_manifest {
            return Err(StoreError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        inner.manifest = Some(manifest.clone());
        inner.manifest_puts += 1;
        Ok(())
    }

    async fn get_chunk(&self, index: usize) -> Result<String, StoreError> {
        let running = self.gets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_gets_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.read_chunk(index);
        self.gets_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn put_chunk(&self, index: usize, data: &str) -> Result<(), StoreError> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_put_chunks.contains(&index) {
            return Err(StoreError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        inner.chunks.insert(index, data.to_string());
        inner.chunk_puts.push(index);
        Ok(())
    }
}
