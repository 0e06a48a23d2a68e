//! Quiver vector crate - similarity, flat-file storage, embeddings and the index.
//!
//! Provides brute-force cosine similarity search over records persisted in a
//! single JSON file, an embedding provider trait with a deterministic hashing
//! implementation, and the [`Index`] that ties documents to stored vectors.

pub mod embedding;
pub mod index;
pub mod record;
pub mod search;
pub mod similarity;
pub mod store;

pub use embedding::{DynEmbeddingProvider, Embedding, EmbeddingProvider, HashEmbedding};
pub use index::Index;
pub use record::Record;
pub use search::{SearchOptions, SearchResult, SearchResults};
pub use similarity::{cosine_similarity, cosine_similarity_batch};
pub use store::{FlatVectorStore, VectorStore};
