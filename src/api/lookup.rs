//! Card scan / manual search endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::lookup::{self as roster_lookup, LookupResult};
use crate::models::EmployeeRecord;
use crate::AppState;

/// Lookup query parameters.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// Scanned card number or typed employee ID.
    #[serde(default)]
    pub q: String,
}

/// GET /api/lookup - Find one employee by card number or ID.
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<EmployeeRecord> {
    let snapshot = state.coordinator.snapshot().await;

    match roster_lookup::find(&snapshot.records, &query.q) {
        LookupResult::Found(record) => success(record.clone()),
        LookupResult::NotFound { query } => {
            Err(AppError::NotFound(format!("Not found: \"{}\"", query)))
        }
    }
}
