//! Dictionary encoding for rosters.
//!
//! Meal type, company, camp and access-card status repeat across thousands of
//! rows, so they are stored once per distinct value and referenced by index.

use std::collections::HashMap;

use crate::models::{EmployeeRecord, EncodedPackage, EncodedRow};

/// Decoding failure for a malformed or corrupted package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A categorical index points past the end of its dictionary.
    IndexOutOfRange {
        row: usize,
        field: &'static str,
        index: usize,
        len: usize,
    },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::IndexOutOfRange {
                row,
                field,
                index,
                len,
            } => write!(
                f,
                "row {}: {} index {} out of range (dictionary has {} entries)",
                row, field, index, len
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// First-seen-order dictionary under construction.
#[derive(Default)]
struct Dictionary {
    values: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Dictionary {
    fn index_of(&mut self, value: &str) -> usize {
        if let Some(&idx) = self.positions.get(value) {
            return idx;
        }
        let idx = self.values.len();
        self.values.push(value.to_string());
        self.positions.insert(value.to_string(), idx);
        idx
    }
}

/// Encode a roster. Deterministic: dictionary order depends only on the order
/// values are first seen in `records`.
pub fn encode(records: &[EmployeeRecord]) -> EncodedPackage {
    let mut meals = Dictionary::default();
    let mut companies = Dictionary::default();
    let mut camps = Dictionary::default();
    let mut access = Dictionary::default();

    let rows = records
        .iter()
        .map(|e| {
            EncodedRow(
                e.employee_id.clone(),
                e.employee_name.clone(),
                meals.index_of(&e.meal_type),
                companies.index_of(&e.company_name),
                camps.index_of(&e.camp_allocation),
                access.index_of(&e.access_card),
                e.card_number.clone(),
            )
        })
        .collect();

    EncodedPackage {
        rows,
        meals: meals.values,
        companies: companies.values,
        camps: camps.values,
        access: access.values,
    }
}

/// Decode a package back into records, in row order.
pub fn decode(package: &EncodedPackage) -> Result<Vec<EmployeeRecord>, CodecError> {
    package
        .rows
        .iter()
        .enumerate()
        .map(|(row, r)| {
            Ok(EmployeeRecord {
                employee_id: r.0.clone(),
                employee_name: r.1.clone(),
                meal_type: lookup(&package.meals, row, "meal", r.2)?,
                company_name: lookup(&package.companies, row, "company", r.3)?,
                camp_allocation: lookup(&package.camps, row, "camp", r.4)?,
                access_card: lookup(&package.access, row, "access", r.5)?,
                card_number: r.6.clone(),
            })
        })
        .collect()
}

fn lookup(
    dictionary: &[String],
    row: usize,
    field: &'static str,
    index: usize,
) -> Result<String, CodecError> {
    dictionary
        .get(index)
        .cloned()
        .ok_or(CodecError::IndexOutOfRange {
            row,
            field,
            index,
            len: dictionary.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, meal: &str, company: &str, camp: &str, access: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            employee_name: format!("Name {}", id),
            meal_type: meal.to_string(),
            company_name: company.to_string(),
            camp_allocation: camp.to_string(),
            access_card: access.to_string(),
            card_number: format!("CARD-{}", id),
        }
    }

    fn sample() -> Vec<EmployeeRecord> {
        vec![
            record("1", "Veg", "Acme", "North", "Active"),
            record("2", "Non-Veg", "Acme", "South", "Active"),
            record("3", "Veg", "Globex", "North", "Blocked"),
            record("4", "Veg", "Acme", "North", "Active"),
        ]
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let roster = sample();
        let decoded = decode(&encode(&roster)).unwrap();
        assert_eq!(decoded, roster);
    }

    #[test]
    fn test_round_trip_empty_roster() {
        let package = encode(&[]);
        assert!(package.rows.is_empty());
        assert!(package.meals.is_empty());
        assert_eq!(decode(&package).unwrap(), Vec::new());
    }

    #[test]
    fn test_dictionaries_are_minimal_and_first_seen() {
        let package = encode(&sample());
        assert_eq!(package.meals, vec!["Veg", "Non-Veg"]);
        assert_eq!(package.companies, vec!["Acme", "Globex"]);
        assert_eq!(package.camps, vec!["North", "South"]);
        assert_eq!(package.access, vec!["Active", "Blocked"]);
    }

    #[test]
    fn test_rows_reference_dictionary_indices() {
        let package = encode(&sample());
        assert_eq!(
            package.rows[2],
            EncodedRow("3".into(), "Name 3".into(), 0, 1, 0, 1, "CARD-3".into())
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let roster = sample();
        let a = serde_json::to_string(&encode(&roster)).unwrap();
        let b = serde_json::to_string(&encode(&roster)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_category_values_round_trip() {
        let roster = vec![record("1", "", "", "", ""), record("2", "Veg", "", "", "")];
        let package = encode(&roster);
        assert_eq!(package.meals, vec!["", "Veg"]);
        assert_eq!(package.companies, vec![""]);
        assert_eq!(decode(&package).unwrap(), roster);
    }

    #[test]
    fn test_decode_rejects_out_of_range_index() {
        let mut package = encode(&sample());
        package.rows[1].4 = 9;

        let err = decode(&package).unwrap_err();
        assert_eq!(
            err,
            CodecError::IndexOutOfRange {
                row: 1,
                field: "camp",
                index: 9,
                len: 2,
            }
        );
    }
}
