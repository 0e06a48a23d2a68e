//! Stored vector records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quiver_core::types::{Document, Metadata, MetadataValue, KEY_CONTENT};

/// A stored unit: an id, the embedding values and a metadata bag.
///
/// Field order matches the persisted JSON layout (`id`, `metadata`, `values`).
/// An empty id means "not yet assigned"; once an id is set it never changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    id: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub values: Vec<f64>,
}

impl Record {
    /// Create a record without an id; the store assigns one on insert.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            values,
        }
    }

    /// Build the record for an embedded document.
    ///
    /// The record gets a fresh id and its own copy of the document's
    /// metadata. With `include_content` the document text is stored under
    /// `content` so it can be recovered from search results.
    pub fn from_document(document: &Document, values: Vec<f64>, include_content: bool) -> Self {
        let mut metadata = document.metadata.clone();
        if include_content {
            metadata.insert(
                KEY_CONTENT.to_string(),
                MetadataValue::String(document.content.clone()),
            );
        }

        Self {
            id: generate_id(),
            metadata,
            values,
        }
    }

    /// Set the id. Ignored if the record already has one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        if self.id.is_empty() {
            self.id = id.into();
        }
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Assign a generated id if none is set and return the (possibly new) id.
    pub fn ensure_id(&mut self) -> &str {
        if self.id.is_empty() {
            self.id = generate_id();
        }
        &self.id
    }
}

/// Generate a globally unique record id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::types::KEY_ID;

    #[test]
    fn test_new_record_has_no_id() {
        let record = Record::new(vec![1.0, 2.0]);
        assert!(!record.has_id());
        assert_eq!(record.id(), "");
    }

    #[test]
    fn test_ensure_id_generates_once() {
        let mut record = Record::new(vec![1.0]);
        let first = record.ensure_id().to_string();
        assert!(!first.is_empty());
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(record.ensure_id(), first);
    }

    #[test]
    fn test_preset_id_is_kept() {
        let mut record = Record::new(vec![1.0]).with_id("custom-id");
        assert_eq!(record.ensure_id(), "custom-id");
        let record = record.with_id("other");
        assert_eq!(record.id(), "custom-id");
    }

    #[test]
    fn test_from_document_copies_metadata() {
        let document = Document::new("some text").with_metadata("source", "notes");
        let mut record = Record::from_document(&document, vec![0.5], false);

        assert!(record.has_id());
        assert_eq!(record.metadata["source"].as_str(), Some("notes"));
        assert!(!record.metadata.contains_key(KEY_CONTENT));

        record.metadata.insert("source".into(), "changed".into());
        assert_eq!(document.metadata["source"].as_str(), Some("notes"));
    }

    #[test]
    fn test_from_document_injects_content() {
        let document = Document::new("hello");
        let record = Record::from_document(&document, vec![0.5], true);
        assert_eq!(record.metadata[KEY_CONTENT].as_str(), Some("hello"));
        assert!(document.metadata.is_empty());
    }

    #[test]
    fn test_from_document_ids_are_unique() {
        let document = Document::new("x");
        let a = Record::from_document(&document, vec![1.0], false);
        let b = Record::from_document(&document, vec![1.0], false);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_json_layout() {
        let record = Record::new(vec![1.0, 0.5])
            .with_id("r1")
            .with_metadata(Metadata::from([(KEY_ID.to_string(), "doc".into())]));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":"r1","metadata":{"id":"doc"},"values":[1.0,0.5]}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_json_missing_id_and_metadata() {
        let record: Record = serde_json::from_str(r#"{"values":[1.0]}"#).unwrap();
        assert!(!record.has_id());
        assert!(record.metadata.is_empty());
    }
}
