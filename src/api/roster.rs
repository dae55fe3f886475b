//! Roster and status endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{EmployeeRecord, LoadRosterRequest, SubmissionInfo};
use crate::sync::SyncStatus;
use crate::AppState;

/// Header data for the UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub record_count: usize,
    /// What the header shows: the last push, or a pending placeholder while
    /// the session is local-only.
    pub submission: Option<SubmissionInfo>,
    pub local_only: bool,
    pub last_synced: Option<String>,
    pub sync: SyncStatus,
}

/// Placeholder provenance for a loaded file that has not been pushed.
fn pending_submission(file_name: &str) -> SubmissionInfo {
    SubmissionInfo {
        submitter_name: "Pending upload".to_string(),
        file_name: file_name.to_string(),
        timestamp: "Not synced".to_string(),
    }
}

/// GET /api/status - Roster summary and sync activity.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let snapshot = state.coordinator.snapshot().await;

    let submission = if snapshot.local_only {
        Some(pending_submission(&snapshot.local_file_name))
    } else {
        snapshot.submission.clone()
    };

    success(StatusResponse {
        record_count: snapshot.records.len(),
        submission,
        local_only: snapshot.local_only,
        last_synced: snapshot.last_synced.clone(),
        sync: state.coordinator.status(),
    })
}

/// GET /api/roster - The full in-memory roster.
pub async fn get_roster(State(state): State<AppState>) -> ApiResult<Vec<EmployeeRecord>> {
    let snapshot = state.coordinator.snapshot().await;
    success(snapshot.records.as_ref().clone())
}

/// Result of handing a parsed file to the coordinator.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRosterResponse {
    pub record_count: usize,
    pub file_name: String,
    pub local_only: bool,
}

/// POST /api/roster - Replace the roster with freshly ingested records.
pub async fn load_roster(
    State(state): State<AppState>,
    Json(request): Json<LoadRosterRequest>,
) -> ApiResult<LoadRosterResponse> {
    if request.records.is_empty() {
        return Err(AppError::Validation(
            "Roster file contained no records".to_string(),
        ));
    }

    let record_count = request.records.len();
    let file_name = request.file_name.trim().to_string();
    state
        .coordinator
        .load_local(request.records, file_name.clone())
        .await;

    success(LoadRosterResponse {
        record_count,
        file_name,
        local_only: true,
    })
}

/// DELETE /api/roster - Clear the roster from memory and the local cache.
pub async fn reset_roster(State(state): State<AppState>) -> ApiResult<()> {
    state.coordinator.reset().await?;
    success(())
}
