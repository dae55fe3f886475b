//! Scan/search lookup against the in-memory roster.

use crate::models::EmployeeRecord;

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult<'a> {
    Found(&'a EmployeeRecord),
    /// Carries the normalized query for display.
    NotFound { query: String },
}

/// Trim and case-fold a scanned or typed query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Find the record whose card number or employee ID equals `query`,
/// ignoring surrounding whitespace and case.
///
/// IDs and card numbers are not validated as unique; with duplicates the
/// first match in roster order is returned.
pub fn find<'a>(records: &'a [EmployeeRecord], query: &str) -> LookupResult<'a> {
    let query = normalize_query(query);
    if query.is_empty() {
        return LookupResult::NotFound { query };
    }

    records
        .iter()
        .find(|e| e.card_number.to_lowercase() == query || e.employee_id.to_lowercase() == query)
        .map(LookupResult::Found)
        .unwrap_or(LookupResult::NotFound { query })
}
