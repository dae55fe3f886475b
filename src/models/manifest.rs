//! Remote manifest and submission provenance.

use serde::{Deserialize, Serialize};

/// Schema tag written by current pushers: chunked, dictionary-encoded, compressed.
pub const MANIFEST_VERSION: u32 = 5;

/// Who pushed the roster that is currently published, and from which file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInfo {
    pub submitter_name: String,
    pub file_name: String,
    pub timestamp: String,
}

/// The single remote entity a reader fetches first.
///
/// `chunk_count` is the only thing telling a reader how many chunk keys to
/// fetch; chunks themselves carry no version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub metadata: Option<SubmissionInfo>,
    #[serde(default)]
    pub v: u32,
}

impl Manifest {
    pub fn new(chunk_count: usize, metadata: SubmissionInfo) -> Self {
        Self {
            chunk_count,
            metadata: Some(metadata),
            v: MANIFEST_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_wire_shape() {
        let manifest = Manifest::new(
            3,
            SubmissionInfo {
                submitter_name: "Ops".into(),
                file_name: "roster.xlsx".into(),
                timestamp: "1/2/2025, 10:00:00".into(),
            },
        );

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            value,
            json!({
                "chunkCount": 3,
                "metadata": {
                    "submitterName": "Ops",
                    "fileName": "roster.xlsx",
                    "timestamp": "1/2/2025, 10:00:00"
                },
                "v": 5
            })
        );
    }

    #[test]
    fn test_manifest_with_null_metadata() {
        let manifest: Manifest =
            serde_json::from_value(json!({ "chunkCount": 0, "metadata": null, "v": 5 })).unwrap();
        assert_eq!(manifest.chunk_count, 0);
        assert!(manifest.metadata.is_none());
    }
}
