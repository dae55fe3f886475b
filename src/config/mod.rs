//! Configuration module for the roster sync backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::errors::AppError;

/// Bucket used by the deployed web client.
pub const DEFAULT_SYNC_BASE_URL: &str = "https://kvdb.io/MN8x9v6w4q2p5r1t7y3z/employee_master_v7";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key required to clear the local roster (unset leaves reset open)
    pub reset_key: Option<String>,
    /// Path to the SQLite file backing the local cache
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Remote bucket base key; manifest and chunk keys are derived from it
    pub sync_base_url: String,
    /// Delay between background pulls
    pub sync_interval: Duration,
    /// Maximum chunk length in characters
    pub chunk_size: NonZeroUsize,
    /// Per-request timeout for the remote store
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reset_key = lookup("ROSTER_RESET_KEY").filter(|s| !s.is_empty());

        let db_path = lookup("ROSTER_DB_PATH")
            .unwrap_or_else(|| "./data/roster.sqlite".to_string())
            .into();

        let bind_addr = lookup("ROSTER_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid ROSTER_BIND_ADDR: {}", e)))?;

        let log_level = lookup("ROSTER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let sync_base_url = lookup("ROSTER_SYNC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SYNC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let sync_interval = Duration::from_secs(parse_positive(
            &lookup,
            "ROSTER_SYNC_INTERVAL_SECS",
            20,
        )?);

        let chunk_size = NonZeroUsize::new(parse_positive(
            &lookup,
            "ROSTER_CHUNK_SIZE",
            DEFAULT_CHUNK_SIZE as u64,
        )? as usize)
        .ok_or_else(|| AppError::Config("ROSTER_CHUNK_SIZE must be positive".to_string()))?;

        let http_timeout =
            Duration::from_secs(parse_positive(&lookup, "ROSTER_HTTP_TIMEOUT_SECS", 15)?);

        Ok(Self {
            reset_key,
            db_path,
            bind_addr,
            log_level,
            sync_base_url,
            sync_interval,
            chunk_size,
            http_timeout,
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{} must be positive", key))),
        Ok(value) => Ok(value),
        Err(e) => Err(AppError::Config(format!("Invalid {}: {}", key, e))),
    }
}
