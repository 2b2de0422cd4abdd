//! Free-form metadata attached to memories, messages and tool state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metadata value.
///
/// Serialized untagged, so a metadata map persists as a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<MetadataValue>),
}

pub type Metadata = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_as_plain_object() {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "segment".into());
        metadata.insert("messages".to_string(), 12i64.into());
        metadata.insert("pinned".to_string(), true.into());
        metadata.insert("topics".to_string(), vec!["coffee", "food"].into());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": 12.0,
                "pinned": true,
                "source": "segment",
                "topics": ["coffee", "food"],
            })
        );

        let parsed: Metadata = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_integer_json_reads_as_number() {
        let parsed: Metadata = serde_json::from_str(r#"{"count": 3}"#).unwrap();
        assert_eq!(parsed["count"].as_f64(), Some(3.0));
        assert_eq!(parsed["count"].as_str(), None);
    }
}
