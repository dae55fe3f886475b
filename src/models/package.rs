//! Dictionary-encoded roster package and the payload shapes found remotely.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use super::employee::lenient_string;
use super::EmployeeRecord;

/// One encoded row: `[id, name, mealIdx, companyIdx, campIdx, accessIdx, cardNo]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRow(
    #[serde(deserialize_with = "lenient_string")] pub String,
    #[serde(deserialize_with = "lenient_string")] pub String,
    pub usize,
    pub usize,
    pub usize,
    pub usize,
    #[serde(deserialize_with = "lenient_string")] pub String,
);

/// Columnar form of a roster. The four categorical columns are replaced by
/// indices into first-seen-order dictionaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPackage {
    #[serde(rename = "r")]
    pub rows: Vec<EncodedRow>,
    #[serde(rename = "m", default)]
    pub meals: Vec<String>,
    #[serde(rename = "c", default)]
    pub companies: Vec<String>,
    #[serde(rename = "l", default)]
    pub camps: Vec<String>,
    #[serde(rename = "a", default)]
    pub access: Vec<String>,
}

/// A decompressed remote body. Older pushers uploaded the flat record array;
/// the version tag postdates that shape, so detection is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePayload {
    Encoded(EncodedPackage),
    Legacy(Vec<EmployeeRecord>),
}

impl RemotePayload {
    /// Parse a decompressed body, telling the shapes apart by the presence of
    /// a rows field rather than by any version number.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match value {
            serde_json::Value::Object(ref map) if map.contains_key("r") => {
                Ok(RemotePayload::Encoded(serde_json::from_value(value)?))
            }
            serde_json::Value::Array(_) => Ok(RemotePayload::Legacy(serde_json::from_value(value)?)),
            _ => Err(serde_json::Error::custom(
                "expected an encoded package or a record array",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_serializes_as_array() {
        let row = EncodedRow("E1".into(), "Ada".into(), 0, 1, 2, 0, "C-1".into());
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!(["E1", "Ada", 0, 1, 2, 0, "C-1"])
        );
    }

    #[test]
    fn test_detects_encoded_shape() {
        let text = json!({
            "r": [["E1", "Ada", 0, 0, 0, 0, "C-1"]],
            "m": ["Veg"], "c": ["Acme"], "l": ["North"], "a": ["Active"],
            "v": 5
        })
        .to_string();

        match RemotePayload::from_json(&text).unwrap() {
            RemotePayload::Encoded(pkg) => {
                assert_eq!(pkg.rows.len(), 1);
                assert_eq!(pkg.meals, vec!["Veg".to_string()]);
            }
            other => panic!("expected encoded payload, got {:?}", other),
        }
    }

    #[test]
    fn test_detects_legacy_shape() {
        let text = json!([{
            "employeeId": "E1", "employeeName": "Ada", "mealType": "Veg",
            "companyName": "Acme", "campAllocation": "North",
            "accessCard": "Active", "cardNumber": "C-1"
        }])
        .to_string();

        match RemotePayload::from_json(&text).unwrap() {
            RemotePayload::Legacy(records) => assert_eq!(records[0].employee_id, "E1"),
            other => panic!("expected legacy payload, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_legacy_array() {
        assert_eq!(
            RemotePayload::from_json("[]").unwrap(),
            RemotePayload::Legacy(Vec::new())
        );
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(RemotePayload::from_json(r#"{"rows": []}"#).is_err());
        assert!(RemotePayload::from_json("42").is_err());
        assert!(RemotePayload::from_json("not json").is_err());
    }

    #[test]
    fn test_rejects_negative_index() {
        let text = r#"{"r": [["E1", "Ada", -1, 0, 0, 0, "C-1"]], "m": [], "c": [], "l": [], "a": []}"#;
        assert!(RemotePayload::from_json(text).is_err());
    }
}
