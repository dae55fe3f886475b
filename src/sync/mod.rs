//! Sync coordinator.
//!
//! Owns the in-memory roster and reconciles it with the remote bucket:
//!
//! - **pull**: manifest → chunks (concurrently) → join → decompress → decode →
//!   replace the roster if it differs and the session is not local-only.
//! - **push**: encode → compress → split → chunks (sequentially) → manifest.
//!
//! The remote side is last-writer-wins with no transactions across keys, so
//! the manifest is always written last and read first. The roster state is
//! replaced as one `Arc`, so readers see either the old roster or the new one.

mod poller;

pub use poller::PollerHandle;

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Local;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};

use crate::db::LocalCache;
use crate::errors::{AppError, SyncError};
use crate::models::{EmployeeRecord, Manifest, RemotePayload, SubmissionInfo};
use crate::store::BlobStore;
use crate::{chunk, codec, compress};

/// Manifests naming more chunks than this are treated as corrupt. At the
/// default chunk size it allows payloads of roughly 100MB.
pub const MAX_CHUNK_COUNT: usize = 2_000;

/// Chunk GETs in flight at once during a pull.
pub const CHUNK_FETCH_CONCURRENCY: usize = 8;

/// Snapshot of everything the UI shows about the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterState {
    pub records: Arc<Vec<EmployeeRecord>>,
    /// Provenance of the last push that reached this session.
    pub submission: Option<SubmissionInfo>,
    /// A loaded file that has not been pushed yet. Pulls never overwrite it.
    pub local_only: bool,
    pub local_file_name: String,
    pub last_synced: Option<String>,
}

/// Current sync activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncStatus {
    Idle,
    Pulling { progress: String },
    Pushing { progress: String },
    Error { message: String },
}

/// What caused a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTrigger {
    /// First pull after start-up
    Initial,
    /// Periodic background pull
    Timer,
    /// Explicit refresh request
    Manual,
}

impl PullTrigger {
    /// Automatic pulls never surface errors and never run while local-only.
    pub fn is_automatic(self) -> bool {
        !matches!(self, PullTrigger::Manual)
    }
}

/// How a pull ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PullOutcome {
    /// Not attempted: local-only session or another pull already running
    Skipped,
    /// Nothing published yet
    NoRemoteData,
    /// Remote roster equals the local one
    Unchanged,
    /// Remote roster replaced the local one
    Applied { records: usize },
    /// Remote roster fetched but dropped in favour of unpushed local data
    DiscardedLocalOnly,
    /// Background pull failed; the failure was logged
    Failed,
}

/// Orchestrates pulls, pushes and the local cache.
pub struct SyncCoordinator {
    store: Arc<dyn BlobStore>,
    cache: LocalCache,
    chunk_size: NonZeroUsize,
    state: RwLock<Arc<RosterState>>,
    status: watch::Sender<SyncStatus>,
    pull_lock: Mutex<()>,
    push_lock: Mutex<()>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn BlobStore>, cache: LocalCache, chunk_size: NonZeroUsize) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            store,
            cache,
            chunk_size,
            state: RwLock::new(Arc::new(RosterState::default())),
            status,
            pull_lock: Mutex::new(()),
            push_lock: Mutex::new(()),
        }
    }

    /// Load the last cached roster, provenance and sync time.
    pub async fn restore(&self) {
        let records = self.cache.load_roster().await;
        let submission = self.cache.load_submission().await;
        let last_synced = self.cache.load_last_sync().await;

        tracing::info!("Restored {} cached records", records.len());

        *self.state.write().await = Arc::new(RosterState {
            records: Arc::new(records),
            submission,
            local_only: false,
            local_file_name: String::new(),
            last_synced,
        });
    }

    /// Current roster state.
    pub async fn snapshot(&self) -> Arc<RosterState> {
        self.state.read().await.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Watch sync activity and progress.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Replace the roster with freshly ingested records. The session stays
    /// local-only until a push succeeds.
    pub async fn load_local(&self, records: Vec<EmployeeRecord>, file_name: String) {
        self.clear_error();
        let mut state = self.state.write().await;
        tracing::info!(
            "Loaded {} records from {:?} (local only)",
            records.len(),
            file_name
        );
        *state = Arc::new(RosterState {
            records: Arc::new(records),
            submission: state.submission.clone(),
            local_only: true,
            local_file_name: file_name,
            last_synced: state.last_synced.clone(),
        });
    }

    /// Drop the roster from memory and from the local cache.
    pub async fn reset(&self) -> Result<(), AppError> {
        self.clear_error();
        let mut state = self.state.write().await;
        *state = Arc::new(RosterState::default());
        self.cache.clear().await?;
        tracing::info!("Local roster reset");
        Ok(())
    }

    /// Pull the published roster.
    ///
    /// Automatic triggers skip local-only sessions, skip when a pull is already
    /// running, and report failures as [`PullOutcome::Failed`]. Manual pulls
    /// wait for a running pull and return failures to the caller.
    pub async fn pull(&self, trigger: PullTrigger) -> Result<PullOutcome, SyncError> {
        let automatic = trigger.is_automatic();

        if automatic && self.state.read().await.local_only {
            self.clear_error();
            return Ok(PullOutcome::Skipped);
        }

        let _guard = if automatic {
            match self.pull_lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::debug!("Pull already in flight, skipping {:?} pull", trigger);
                    return Ok(PullOutcome::Skipped);
                }
            }
        } else {
            self.pull_lock.lock().await
        };

        self.set_pull_status(SyncStatus::Pulling {
            progress: "Manifest...".to_string(),
        });

        let result = match self.fetch_remote().await {
            Ok(Some((records, submission))) => Ok(self.apply_remote(records, submission).await),
            Ok(None) => Ok(PullOutcome::NoRemoteData),
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                tracing::debug!("{:?} pull finished: {:?}", trigger, outcome);
                self.set_pull_status(SyncStatus::Idle);
                Ok(outcome)
            }
            Err(err) if automatic => {
                tracing::warn!("Background pull failed: {}", err);
                self.set_pull_status(SyncStatus::Idle);
                Ok(PullOutcome::Failed)
            }
            Err(err) => {
                tracing::error!("Pull failed: {}", err);
                self.set_pull_status(SyncStatus::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Fetch and decode the published roster. `Ok(None)` means nothing usable
    /// has been published.
    async fn fetch_remote(
        &self,
    ) -> Result<Option<(Vec<EmployeeRecord>, Option<SubmissionInfo>)>, SyncError> {
        let manifest = match self.store.get_manifest().await {
            Ok(Some(manifest)) => manifest,
            Ok(None) => return Ok(None),
            Err(e) => return Err(SyncError::ManifestFetch(e.to_string())),
        };

        let total = manifest.chunk_count;
        if total == 0 {
            return Ok(None);
        }
        if total > MAX_CHUNK_COUNT {
            return Err(SyncError::MalformedPayload(format!(
                "manifest names {} chunks (limit {})",
                total, MAX_CHUNK_COUNT
            )));
        }

        self.set_pull_status(SyncStatus::Pulling {
            progress: format!("Chunks (0/{})", total),
        });

        let fetched = AtomicUsize::new(0);
        // `buffered` yields in index order regardless of completion order.
        let chunks: Vec<String> = stream::iter(0..total)
            .map(|index| {
                let fetched = &fetched;
                async move {
                    let chunk = self.store.get_chunk(index).await.map_err(|e| {
                        SyncError::ChunkFetch {
                            index,
                            message: e.to_string(),
                        }
                    })?;
                    let done = fetched.fetch_add(1, Ordering::Relaxed) + 1;
                    self.set_pull_status(SyncStatus::Pulling {
                        progress: format!("Chunks ({}/{})", done, total),
                    });
                    Ok::<_, SyncError>(chunk)
                }
            })
            .buffered(CHUNK_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let joined = chunk::join(&chunks);
        let text = compress::decompress(&joined).ok_or_else(|| {
            SyncError::MalformedPayload("payload did not decompress".to_string())
        })?;

        let records = match RemotePayload::from_json(&text)
            .map_err(|e| SyncError::MalformedPayload(e.to_string()))?
        {
            RemotePayload::Encoded(package) => codec::decode(&package)?,
            RemotePayload::Legacy(records) => {
                tracing::debug!("Remote payload uses the legacy flat layout");
                records
            }
        };

        Ok(Some((records, manifest.metadata)))
    }

    async fn apply_remote(
        &self,
        records: Vec<EmployeeRecord>,
        submission: Option<SubmissionInfo>,
    ) -> PullOutcome {
        let mut state = self.state.write().await;

        if state.local_only {
            tracing::info!("Discarding remote roster: local data has not been pushed");
            return PullOutcome::DiscardedLocalOnly;
        }
        if *state.records == records {
            return PullOutcome::Unchanged;
        }

        let count = records.len();
        let records = Arc::new(records);
        let now = sync_time();

        *state = Arc::new(RosterState {
            records: records.clone(),
            submission: submission.clone(),
            local_only: false,
            local_file_name: state.local_file_name.clone(),
            last_synced: Some(now.clone()),
        });
        // Still holding the write lock so cache writes follow memory order.
        self.persist(&records, submission.as_ref(), &now).await;

        tracing::info!("Applied remote roster with {} records", count);
        PullOutcome::Applied { records: count }
    }

    /// Publish the current roster. Chunks go up one at a time in index order
    /// and the manifest last; nothing is committed locally unless the
    /// manifest lands.
    pub async fn push(&self, submitter_name: &str) -> Result<SubmissionInfo, SyncError> {
        let submitter = submitter_name.trim();
        if submitter.is_empty() {
            return Err(SyncError::MissingSubmitter);
        }

        let Ok(_guard) = self.push_lock.try_lock() else {
            return Err(SyncError::Busy("push"));
        };

        let snapshot = self.snapshot().await;
        tracing::info!(
            "Pushing {} records from {:?} as {}",
            snapshot.records.len(),
            snapshot.local_file_name,
            submitter
        );

        match self.upload(&snapshot, submitter).await {
            Ok(info) => {
                self.commit_push(&snapshot, &info).await;
                self.finish_status(None);
                Ok(info)
            }
            Err(err) => {
                tracing::error!("{}", err);
                self.finish_status(Some(err.to_string()));
                Err(err)
            }
        }
    }

    async fn upload(
        &self,
        snapshot: &RosterState,
        submitter: &str,
    ) -> Result<SubmissionInfo, SyncError> {
        self.set_progress(SyncStatus::Pushing {
            progress: "Encoding...".to_string(),
        });
        let package = codec::encode(&snapshot.records);
        let text =
            serde_json::to_string(&package).map_err(|e| SyncError::Encode(e.to_string()))?;

        self.set_progress(SyncStatus::Pushing {
            progress: "Compressing...".to_string(),
        });
        let transport = compress::compress(&text);
        let chunks = split_payload(&transport, self.chunk_size)?;
        let total = chunks.len();

        for (index, data) in chunks.iter().enumerate() {
            self.set_progress(SyncStatus::Pushing {
                progress: format!("Uploading {}/{}", index + 1, total),
            });
            self.store
                .put_chunk(index, data)
                .await
                .map_err(|e| SyncError::ChunkUpload {
                    index,
                    total,
                    message: e.to_string(),
                })?;
        }

        self.set_progress(SyncStatus::Pushing {
            progress: "Finalizing...".to_string(),
        });
        let info = SubmissionInfo {
            submitter_name: submitter.to_string(),
            file_name: snapshot.local_file_name.clone(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.store
            .put_manifest(&Manifest::new(total, info.clone()))
            .await
            .map_err(|e| SyncError::ManifestPublish(e.to_string()))?;

        tracing::info!("Published {} chunks ({} bytes)", total, transport.len());
        Ok(info)
    }

    async fn commit_push(&self, pushed: &RosterState, info: &SubmissionInfo) {
        let mut state = self.state.write().await;
        let now = sync_time();
        // A file loaded while the push ran stays local-only.
        let still_current = Arc::ptr_eq(&state.records, &pushed.records);

        *state = Arc::new(RosterState {
            records: state.records.clone(),
            submission: Some(info.clone()),
            local_only: state.local_only && !still_current,
            local_file_name: state.local_file_name.clone(),
            last_synced: Some(now.clone()),
        });

        if still_current {
            self.persist(&pushed.records, Some(info), &now).await;
        } else {
            tracing::warn!("Roster replaced during push; newer local data is still unpushed");
        }
    }

    async fn persist(&self, records: &[EmployeeRecord], info: Option<&SubmissionInfo>, now: &str) {
        let result = async {
            self.cache.save_roster(records).await?;
            self.cache.save_submission(info).await?;
            self.cache.save_last_sync(now).await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!("Failed to update local cache: {}", e);
        }
    }

    fn set_progress(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    /// Publish a pull status unless a push is reporting progress.
    fn set_pull_status(&self, next: SyncStatus) {
        self.status.send_if_modified(|current| {
            if matches!(current, SyncStatus::Pushing { .. }) || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// A reported failure lasts until the next operation starts.
    fn clear_error(&self) {
        self.status.send_if_modified(|current| {
            if !matches!(current, SyncStatus::Error { .. }) {
                return false;
            }
            *current = SyncStatus::Idle;
            true
        });
    }

    /// Leave the active state: back to idle, or to error with `message`.
    fn finish_status(&self, message: Option<String>) {
        let next = match message {
            Some(message) => SyncStatus::Error { message },
            None => SyncStatus::Idle,
        };
        self.status.send_replace(next);
    }

    /// Start the owned polling task: an initial pull right away, then a
    /// timer pull every `interval`.
    pub fn spawn_poller(self: &Arc<Self>, interval: std::time::Duration) -> PollerHandle {
        poller::spawn(self.clone(), interval)
    }
}

/// Split the compressed payload into upload chunks. An empty payload would
/// publish a zero-chunk manifest, which readers take as "nothing published".
fn split_payload(transport: &str, chunk_size: NonZeroUsize) -> Result<Vec<String>, SyncError> {
    let chunks = chunk::split(transport, chunk_size);
    if chunks.is_empty() {
        return Err(SyncError::Encode("compressed payload is empty".to_string()));
    }
    Ok(chunks)
}

fn sync_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
