//! Error handling module for the roster sync backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::codec::CodecError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SYNC_BUSY: &str = "SYNC_BUSY";
    pub const MANIFEST_FETCH_FAILED: &str = "MANIFEST_FETCH_FAILED";
    pub const CHUNK_FETCH_FAILED: &str = "CHUNK_FETCH_FAILED";
    pub const MALFORMED_PAYLOAD: &str = "MALFORMED_PAYLOAD";
    pub const DECODE_FAILED: &str = "DECODE_FAILED";
    pub const CHUNK_UPLOAD_FAILED: &str = "CHUNK_UPLOAD_FAILED";
    pub const MANIFEST_PUBLISH_FAILED: &str = "MANIFEST_PUBLISH_FAILED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Failure of a pull or push, naming the stage that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Push requested without a submitter name
    MissingSubmitter,
    /// Another operation of the same kind is running
    Busy(&'static str),
    /// Manifest could not be fetched
    ManifestFetch(String),
    /// A chunk named by the manifest could not be fetched
    ChunkFetch { index: usize, message: String },
    /// Joined chunks did not decompress or parse
    MalformedPayload(String),
    /// Encoded rows reference missing dictionary entries
    Decode(CodecError),
    /// The local roster could not be serialized for upload
    Encode(String),
    /// A chunk upload failed; the manifest was not touched
    ChunkUpload {
        index: usize,
        total: usize,
        message: String,
    },
    /// All chunks landed but the manifest could not be published
    ManifestPublish(String),
}

impl SyncError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::MissingSubmitter => codes::VALIDATION_ERROR,
            SyncError::Busy(_) => codes::SYNC_BUSY,
            SyncError::ManifestFetch(_) => codes::MANIFEST_FETCH_FAILED,
            SyncError::ChunkFetch { .. } => codes::CHUNK_FETCH_FAILED,
            SyncError::MalformedPayload(_) => codes::MALFORMED_PAYLOAD,
            SyncError::Decode(_) => codes::DECODE_FAILED,
            SyncError::Encode(_) => codes::INTERNAL_ERROR,
            SyncError::ChunkUpload { .. } => codes::CHUNK_UPLOAD_FAILED,
            SyncError::ManifestPublish(_) => codes::MANIFEST_PUBLISH_FAILED,
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::MissingSubmitter => write!(f, "Submitter name is required"),
            SyncError::Busy(what) => write!(f, "A {} is already in progress", what),
            SyncError::ManifestFetch(msg) => write!(f, "Pull failed: manifest fetch: {}", msg),
            SyncError::ChunkFetch { index, message } => {
                write!(f, "Pull failed: chunk {} fetch: {}", index, message)
            }
            SyncError::MalformedPayload(msg) => {
                write!(f, "Pull failed: remote data unreadable: {}", msg)
            }
            SyncError::Decode(err) => write!(f, "Pull failed: remote data corrupt: {}", err),
            SyncError::Encode(msg) => write!(f, "Push failed: could not encode roster: {}", msg),
            SyncError::ChunkUpload {
                index,
                total,
                message,
            } => write!(
                f,
                "Push failed: chunk {} of {} upload failed: {}",
                index + 1,
                total,
                message
            ),
            SyncError::ManifestPublish(msg) => {
                write!(f, "Push failed: manifest publish failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for SyncError {}

impl From<CodecError> for SyncError {
    fn from(err: CodecError) -> Self {
        SyncError::Decode(err)
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Pull or push failure
    Sync(SyncError),
    /// Local cache error
    Database(String),
    /// Invalid configuration
    Config(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Sync(SyncError::MissingSubmitter) => StatusCode::BAD_REQUEST,
            AppError::Sync(SyncError::Busy(_)) => StatusCode::CONFLICT,
            AppError::Sync(SyncError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Sync(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Sync(err) => err.error_code(),
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Sync(err) => err.to_string(),
            AppError::Database(msg) => msg.clone(),
            AppError::Config(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        AppError::Sync(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Sync(SyncError::ChunkFetch { index, .. }) => {
                Some(serde_json::json!({ "chunkIndex": index }))
            }
            AppError::Sync(SyncError::ChunkUpload { index, total, .. }) => {
                Some(serde_json::json!({ "chunkIndex": index, "chunkCount": total }))
            }
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_failures_are_distinguishable() {
        let chunk = AppError::Sync(SyncError::ChunkUpload {
            index: 1,
            total: 3,
            message: "HTTP 500".into(),
        });
        let manifest = AppError::Sync(SyncError::ManifestPublish("HTTP 500".into()));

        assert_eq!(chunk.error_code(), codes::CHUNK_UPLOAD_FAILED);
        assert_eq!(manifest.error_code(), codes::MANIFEST_PUBLISH_FAILED);
        assert!(chunk.message().contains("chunk 2 of 3"));
        assert!(manifest.message().contains("manifest publish failed"));
    }

    #[test]
    fn test_sync_status_codes() {
        assert_eq!(
            AppError::Sync(SyncError::Busy("push")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Sync(SyncError::MissingSubmitter).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Sync(SyncError::ManifestFetch("timeout".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_encode_failure_is_internal() {
        let err = AppError::Sync(SyncError::Encode("compressed payload is empty".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), codes::INTERNAL_ERROR);
    }

    #[test]
    fn test_error_response_carries_chunk_details() {
        let err = AppError::Sync(SyncError::ChunkUpload {
            index: 1,
            total: 3,
            message: "HTTP 500".into(),
        });
        let body = ErrorResponse::new(&err);
        assert!(!body.success);
        assert_eq!(body.error.code, codes::CHUNK_UPLOAD_FAILED);
        assert_eq!(body.error.details.unwrap()["chunkCount"], 3);
    }
}
