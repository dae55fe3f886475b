//! Filtered report endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::models::EmployeeRecord;
use crate::report::{self, FilterOptions, ReportFilter};
use crate::AppState;

/// Raw filter values as the UI sends them (`All` or empty for no filter).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub meal_type: Option<String>,
    pub company: Option<String>,
    pub camp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub options: FilterOptions,
    /// The selection after dropping values no longer available.
    pub filter: ReportFilter,
    pub records: Vec<EmployeeRecord>,
    pub total: usize,
    pub database_size: usize,
}

/// GET /api/report - Cascading filter options and the matching records.
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<ReportResponse> {
    let snapshot = state.coordinator.snapshot().await;
    let requested = ReportFilter::from_params(query.meal_type, query.company, query.camp);

    let (options, filter) = report::resolve(&snapshot.records, requested);
    let records: Vec<EmployeeRecord> = report::apply(&snapshot.records, &filter)
        .into_iter()
        .cloned()
        .collect();

    success(ReportResponse {
        options,
        filter,
        total: records.len(),
        records,
        database_size: snapshot.records.len(),
    })
}
