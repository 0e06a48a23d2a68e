//! Document-level index over a vector store.
//!
//! [`Index`] embeds documents in batches through an [`EmbeddingProvider`],
//! stores one [`Record`] per document in a [`VectorStore`], and writes each
//! record id back into its document under the `id` metadata key. Queries are
//! embedded the same way and forwarded to the store's similarity search.
//!
//! Every failure raised here is wrapped in [`QuiverError::Internal`]. Batches
//! that were inserted before a failure stay in the store.

use tracing::{debug, info};

use quiver_core::config::IndexConfig;
use quiver_core::error::{QuiverError, Result};
use quiver_core::types::{Document, MetadataValue, KEY_ID};

use crate::embedding::{Embedding, EmbeddingProvider};
use crate::record::Record;
use crate::search::{SearchOptions, SearchResults};
use crate::store::VectorStore;

/// Documents embedded per provider call unless configured otherwise.
pub const DEFAULT_BATCH_INSERT_SIZE: usize = 32;

/// Coordinates an embedding provider and a vector store.
#[derive(Debug)]
pub struct Index<S, E> {
    store: S,
    embedder: E,
    batch_insert_size: usize,
    include_content: bool,
}

impl<S, E> Index<S, E>
where
    S: VectorStore,
    E: EmbeddingProvider,
{
    /// Create an index with a batch size of 32 and content injection off.
    pub fn new(store: S, embedder: E) -> Self {
        Self {
            store,
            embedder,
            batch_insert_size: DEFAULT_BATCH_INSERT_SIZE,
            include_content: false,
        }
    }

    /// Create an index using the `[index]` configuration section.
    pub fn from_config(store: S, embedder: E, config: &IndexConfig) -> Self {
        Self::new(store, embedder)
            .with_batch_insert_size(config.batch_insert_size)
            .with_include_content(config.include_content)
    }

    /// Set how many documents go into one provider call. Zero is treated as one.
    pub fn with_batch_insert_size(mut self, batch_insert_size: usize) -> Self {
        self.batch_insert_size = batch_insert_size.max(1);
        self
    }

    /// Copy each document's text into its record's metadata under `content`.
    pub fn with_include_content(mut self, include_content: bool) -> Self {
        self.include_content = include_content;
        self
    }

    pub fn batch_insert_size(&self) -> usize {
        self.batch_insert_size
    }

    pub fn include_content(&self) -> bool {
        self.include_content
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn into_parts(self) -> (S, E) {
        (self.store, self.embedder)
    }

    /// Embed and store `documents`, recording each new record id in the
    /// document's metadata under `id`.
    ///
    /// Documents are processed in consecutive batches of at most
    /// `batch_insert_size`, one provider call per batch. On failure the
    /// batches already inserted stay in the store and keep their ids.
    pub async fn load_from_documents(&mut self, documents: &mut [Document]) -> Result<()> {
        self.batch_upsert(documents)
            .await
            .map_err(QuiverError::internal)?;

        info!(
            documents = documents.len(),
            batch_insert_size = self.batch_insert_size,
            "Documents indexed"
        );
        Ok(())
    }

    /// Whether the underlying store holds no records.
    pub fn is_empty(&mut self) -> Result<bool> {
        self.store.is_empty().map_err(QuiverError::internal)
    }

    /// Search the store with an already-embedded query vector.
    pub fn search(&mut self, values: &[f64], options: SearchOptions) -> Result<SearchResults> {
        self.store
            .search(values, &options)
            .map_err(QuiverError::internal)
    }

    /// Embed `query` and search the store with the resulting vector.
    pub async fn query(&mut self, query: &str, options: SearchOptions) -> Result<SearchResults> {
        let values = self
            .embed_query(query)
            .await
            .map_err(QuiverError::internal)?;
        self.search(&values, options)
    }

    async fn embed_query(&self, query: &str) -> Result<Embedding> {
        let embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let [values]: [Embedding; 1] =
            embeddings
                .try_into()
                .map_err(|rest: Vec<Embedding>| QuiverError::EmbeddingCount {
                    expected: 1,
                    actual: rest.len(),
                })?;
        Ok(values)
    }

    async fn batch_upsert(&mut self, documents: &mut [Document]) -> Result<()> {
        for (batch_no, batch) in documents.chunks_mut(self.batch_insert_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();

            let embeddings = self.embedder.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(QuiverError::EmbeddingCount {
                    expected: batch.len(),
                    actual: embeddings.len(),
                });
            }

            let records: Vec<Record> = batch
                .iter()
                .zip(embeddings)
                .map(|(document, values)| {
                    Record::from_document(document, values, self.include_content)
                })
                .collect();
            let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();

            self.store.insert(records)?;

            for (document, id) in batch.iter_mut().zip(ids) {
                document
                    .metadata
                    .insert(KEY_ID.to_string(), MetadataValue::String(id));
            }

            debug!(batch = batch_no, size = batch.len(), "Batch indexed");
        }

        Ok(())
    }
}
