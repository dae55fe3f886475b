//! Manual sync endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::SubmissionInfo;
use crate::sync::{PullOutcome, PullTrigger};
use crate::AppState;

/// Body of a push request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    #[serde(default)]
    pub submitter_name: String,
}

/// POST /api/sync/pull - Refresh from the remote bucket now.
pub async fn pull(State(state): State<AppState>) -> ApiResult<PullOutcome> {
    let outcome = state.coordinator.pull(PullTrigger::Manual).await?;
    success(outcome)
}

/// POST /api/sync/push - Publish the current roster.
pub async fn push(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> ApiResult<SubmissionInfo> {
    let info = state.coordinator.push(&request.submitter_name).await?;
    success(info)
}
