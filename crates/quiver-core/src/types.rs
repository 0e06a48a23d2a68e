use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Reserved metadata keys
// =============================================================================

/// Metadata key under which the index records a document's stored vector id.
pub const KEY_ID: &str = "id";

/// Metadata key under which a record may carry its source text.
pub const KEY_CONTENT: &str = "content";

// =============================================================================
// Metadata
// =============================================================================

/// String-keyed metadata bag attached to documents and stored records.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
///
/// Serialized untagged so a metadata bag reads as a plain JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Borrow the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Integer(i) => Some(*i as f64),
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Integer(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<Vec<MetadataValue>> for MetadataValue {
    fn from(value: Vec<MetadataValue>) -> Self {
        MetadataValue::List(value)
    }
}

impl From<Metadata> for MetadataValue {
    fn from(value: Metadata) -> Self {
        MetadataValue::Map(value)
    }
}

// =============================================================================
// Document
// =============================================================================

/// A piece of text plus its metadata, as handed to and returned by the index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata insert.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The id of the vector stored for this document, once indexed.
    pub fn id(&self) -> Option<&str> {
        self.metadata.get(KEY_ID).and_then(MetadataValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_value_json_is_untagged() {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "wiki".into());
        metadata.insert("page".into(), 3i64.into());
        metadata.insert("weight".into(), 0.5f64.into());
        metadata.insert("draft".into(), false.into());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"source": "wiki", "page": 3, "weight": 0.5, "draft": false})
        );
    }

    #[test]
    fn test_metadata_value_deserialize_variants() {
        let parsed: Metadata = serde_json::from_str(
            r#"{"a": 1, "b": 1.5, "c": "x", "d": true, "e": null, "f": [1, "y"], "g": {"h": 2}}"#,
        )
        .unwrap();
        assert_eq!(parsed["a"], MetadataValue::Integer(1));
        assert_eq!(parsed["b"], MetadataValue::Float(1.5));
        assert_eq!(parsed["c"].as_str(), Some("x"));
        assert_eq!(parsed["d"].as_bool(), Some(true));
        assert!(parsed["e"].is_null());
        assert_eq!(
            parsed["f"],
            MetadataValue::List(vec![MetadataValue::Integer(1), "y".into()])
        );
        match &parsed["g"] {
            MetadataValue::Map(inner) => assert_eq!(inner["h"], MetadataValue::Integer(2)),
            other => panic!("Expected Map, got {:?}", other),
        }
    }

    #[test]
    fn test_as_f64_widens_integers() {
        assert_eq!(MetadataValue::Integer(2).as_f64(), Some(2.0));
        assert_eq!(MetadataValue::Float(0.25).as_f64(), Some(0.25));
        assert_eq!(MetadataValue::from("2").as_f64(), None);
    }

    #[test]
    fn test_document_builder_and_id() {
        let doc = Document::new("hello").with_metadata("lang", "en");
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.metadata["lang"].as_str(), Some("en"));
        assert_eq!(doc.id(), None);

        let doc = doc.with_metadata(KEY_ID, "abc");
        assert_eq!(doc.id(), Some("abc"));
    }

    #[test]
    fn test_document_deserialize_without_metadata() {
        let doc: Document = serde_json::from_str(r#"{"content": "bare"}"#).unwrap();
        assert_eq!(doc.content, "bare");
        assert!(doc.metadata.is_empty());
    }
}
