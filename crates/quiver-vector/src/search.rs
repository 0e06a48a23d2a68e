//! Search options and results.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use quiver_core::types::{Document, Metadata, MetadataValue, KEY_CONTENT};

use crate::record::Record;

/// Number of results returned when no explicit `top_k` is given.
pub const DEFAULT_TOP_K: usize = 10;

/// Filter over the full scored result set, applied before truncation.
pub type FilterFn = dyn Fn(Vec<SearchResult>) -> Vec<SearchResult> + Send + Sync;

/// Options for a vector search.
#[derive(Clone)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    pub top_k: usize,
    /// Optional filter run over every scored record before sorting and truncation.
    pub filter: Option<Arc<FilterFn>>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Install a filter that sees the whole scored set at once.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Vec<SearchResult>) -> Vec<SearchResult> + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Install a filter that keeps the results matching `predicate`.
    pub fn with_predicate<P>(self, predicate: P) -> Self
    where
        P: Fn(&SearchResult) -> bool + Send + Sync + 'static,
    {
        self.with_filter(move |mut results: Vec<SearchResult>| {
            results.retain(|r| predicate(r));
            results
        })
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            filter: None,
        }
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("top_k", &self.top_k)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A stored record paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub record: Record,
    /// Cosine similarity; higher is more similar.
    pub score: f64,
}

impl SearchResult {
    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.record.metadata
    }

    /// The stored source text, if the record carries one.
    pub fn content(&self) -> Option<&str> {
        self.record
            .metadata
            .get(KEY_CONTENT)
            .and_then(MetadataValue::as_str)
    }

    /// Convert into a document, moving `content` out of the metadata.
    pub fn into_document(self) -> Document {
        let mut metadata = self.record.metadata;
        let content = match metadata.remove(KEY_CONTENT) {
            Some(MetadataValue::String(s)) => s,
            _ => String::new(),
        };
        Document { content, metadata }
    }
}

/// Ordered search results, best match first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchResults(Vec<SearchResult>);

impl SearchResults {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&SearchResult> {
        self.0.first()
    }

    pub fn into_inner(self) -> Vec<SearchResult> {
        self.0
    }

    /// Map every result back to a document, dropping the score.
    ///
    /// The `content` metadata entry becomes the document text (empty when
    /// absent or not a string) and is removed from the metadata. Each document
    /// owns a copy, so the results stay untouched.
    pub fn to_documents(&self) -> Vec<Document> {
        self.0.iter().cloned().map(SearchResult::into_document).collect()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.0.into_iter().map(SearchResult::into_document).collect()
    }
}

impl From<Vec<SearchResult>> for SearchResults {
    fn from(results: Vec<SearchResult>) -> Self {
        Self(results)
    }
}

impl FromIterator<SearchResult> for SearchResults {
    fn from_iter<I: IntoIterator<Item = SearchResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for SearchResults {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for SearchResults {
    type Output = SearchResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(metadata: Metadata, score: f64) -> SearchResult {
        SearchResult {
            record: Record::new(vec![1.0]).with_id("r").with_metadata(metadata),
            score,
        }
    }

    #[test]
    fn test_default_options() {
        let options = SearchOptions::default();
        assert_eq!(options.top_k, 10);
        assert!(options.filter.is_none());
    }

    #[test]
    fn test_predicate_keeps_matching() {
        let options = SearchOptions::new().with_predicate(|r| r.score > 0.5);
        let filter = options.filter.unwrap();
        let kept = (*filter)(vec![
            result_with(Metadata::new(), 0.9),
            result_with(Metadata::new(), 0.1),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_options_debug_hides_closure() {
        let options = SearchOptions::new().with_top_k(3).with_filter(|r| r);
        let debug = format!("{:?}", options);
        assert!(debug.contains("top_k: 3"));
        assert!(debug.contains("<fn>"));
    }

    #[test]
    fn test_to_documents_extracts_content() {
        let metadata = Metadata::from([
            (KEY_CONTENT.to_string(), "hello".into()),
            ("lang".to_string(), "en".into()),
        ]);
        let results = SearchResults::from(vec![result_with(metadata, 0.8)]);

        let documents = results.to_documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "hello");
        assert!(!documents[0].metadata.contains_key(KEY_CONTENT));
        assert_eq!(documents[0].metadata["lang"].as_str(), Some("en"));

        // The results keep their own metadata.
        assert_eq!(results[0].content(), Some("hello"));
    }

    #[test]
    fn test_to_documents_missing_content_defaults_empty() {
        let results = SearchResults::from(vec![result_with(Metadata::new(), 0.8)]);
        let documents = results.into_documents();
        assert_eq!(documents[0].content, "");
        assert!(documents[0].metadata.is_empty());
    }

    #[test]
    fn test_to_documents_non_string_content() {
        let metadata = Metadata::from([(KEY_CONTENT.to_string(), 42i64.into())]);
        let documents = SearchResults::from(vec![result_with(metadata, 0.8)]).into_documents();
        assert_eq!(documents[0].content, "");
        assert!(!documents[0].metadata.contains_key(KEY_CONTENT));
    }

    #[test]
    fn test_results_serialize_as_array() {
        let results = SearchResults::from(vec![result_with(Metadata::new(), 0.5)]);
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["score"], 0.5);
        assert_eq!(json[0]["record"]["id"], "r");
    }
}
