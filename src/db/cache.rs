//! Local persistence cache for the roster snapshot and sync bookkeeping.
//!
//! Every read is best effort: a missing or unreadable value degrades to an
//! empty roster or `None` instead of failing startup.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{EmployeeRecord, SubmissionInfo};

pub const ROSTER_KEY: &str = "roster_snapshot";
pub const SUBMISSION_KEY: &str = "submission_info";
pub const LAST_SYNC_KEY: &str = "last_sync";

/// Key/value cache surviving process restarts.
#[derive(Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the cached roster. Missing or corrupt snapshots yield an empty roster.
    pub async fn load_roster(&self) -> Vec<EmployeeRecord> {
        let Some(raw) = self.get(ROSTER_KEY).await else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Discarding corrupt roster snapshot: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn save_roster(&self, records: &[EmployeeRecord]) -> Result<(), AppError> {
        let raw = serde_json::to_string(records)?;
        self.set(ROSTER_KEY, &raw).await
    }

    /// Load the provenance of the last applied push, if any.
    pub async fn load_submission(&self) -> Option<SubmissionInfo> {
        let raw = self.get(SUBMISSION_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!("Discarding corrupt submission info: {}", e);
                None
            }
        }
    }

    /// Store or clear the submission info.
    pub async fn save_submission(&self, info: Option<&SubmissionInfo>) -> Result<(), AppError> {
        match info {
            Some(info) => {
                let raw = serde_json::to_string(info)?;
                self.set(SUBMISSION_KEY, &raw).await
            }
            None => self.remove(SUBMISSION_KEY).await,
        }
    }

    pub async fn load_last_sync(&self) -> Option<String> {
        self.get(LAST_SYNC_KEY).await
    }

    pub async fn save_last_sync(&self, timestamp: &str) -> Result<(), AppError> {
        self.set(LAST_SYNC_KEY, timestamp).await
    }

    /// Remove the cached roster and its provenance.
    pub async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv WHERE key IN (?, ?, ?)")
            .bind(ROSTER_KEY)
            .bind(SUBMISSION_KEY)
            .bind(LAST_SYNC_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<String> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await;
        match row {
            Ok(row) => row.map(|r| r.get("value")),
            Err(e) => {
                tracing::warn!("Failed to read cache key {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
