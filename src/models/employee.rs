//! Employee record model matching the frontend Employee interface.

use serde::{Deserialize, Deserializer, Serialize};

/// One roster entry.
///
/// Records are never edited in place; the roster is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meal_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub camp_allocation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub access_card: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub card_number: String,
}

/// Request body handed over by the file ingestion collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRosterRequest {
    #[serde(default)]
    pub file_name: String,
    pub records: Vec<EmployeeRecord>,
}

/// Spreadsheet exports often carry numeric IDs and card numbers, and empty
/// cells arrive as null. All of them are stored as strings.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Bool(b) => b.to_string(),
        Raw::Null => String::new(),
    })
}
