//! Data package manifests (`datapackage.json`)

use crate::error::{ProvError, Result};
use serde::Deserialize;

/// The parts of a data package manifest that provenance records
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataPackage {
    pub resources: Vec<Resource>,
}

/// One produced data file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource {
    pub name: String,
    pub path: String,
    pub format: String,
    /// Location of the raw data this resource was streamed from
    #[serde(rename = "dpp:streamedFrom", default)]
    pub streamed_from: Option<String>,
}

impl DataPackage {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProvError::malformed_manifest(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ProvError::malformed_manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_parse_resources() {
        let package = DataPackage::parse(
            br#"{
                "name": "pkg",
                "resources": [
                    {"name": "out.csv", "path": "out.csv", "format": "csv", "profile": "tabular-data-resource"},
                    {"name": "raw", "path": "raw.csv", "format": "csv", "dpp:streamedFrom": "s3://in/raw.csv"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(package.resources.len(), 2);
        assert_eq!(package.resources[0].streamed_from, None);
        assert_eq!(
            package.resources[1].streamed_from.as_deref(),
            Some("s3://in/raw.csv")
        );
    }

    #[test]
    fn test_malformed_manifests() {
        for value in [
            json!([]),
            json!({"name": "no resources"}),
            json!({"resources": {"name": "x"}}),
            json!({"resources": [{"name": "x", "path": "x.csv"}]}),
        ] {
            let err = DataPackage::from_value(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedManifest);
        }
        let err = DataPackage::parse(b"not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }
}
