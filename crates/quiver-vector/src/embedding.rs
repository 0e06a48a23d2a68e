//! Embedding provider trait and the built-in hashing provider.
//!
//! - [`EmbeddingProvider`] turns a batch of texts into one vector per text,
//!   in input order. Network-backed providers live outside this crate.
//! - [`HashEmbedding`] produces deterministic hash-based vectors. It carries
//!   no semantics and is meant for tests, benches and offline use.

use std::future::Future;
use std::pin::Pin;

use quiver_core::error::{QuiverError, Result};

/// Embedding vector as produced by a provider.
pub type Embedding = Vec<f64>;

/// Service that turns texts into fixed-length vectors.
///
/// Implementations must return exactly one embedding per input text, in the
/// same order, and report their own failures as [`QuiverError::Provider`].
/// Dropping the returned future cancels the call.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every text in `texts`.
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Embedding>>> + Send;
}

/// Object-safe version of [`EmbeddingProvider`] for dynamic dispatch.
///
/// `EmbeddingProvider::embed` returns `impl Future`, which rules out
/// `dyn EmbeddingProvider`. This trait boxes the future instead; every
/// `EmbeddingProvider` gets it through the blanket impl below.
pub trait DynEmbeddingProvider: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Embedding>>> + Send + 'a>>;
}

impl<T: EmbeddingProvider> DynEmbeddingProvider for T {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Embedding>>> + Send + 'a>> {
        Box::pin(self.embed(texts))
    }
}

impl EmbeddingProvider for Box<dyn DynEmbeddingProvider> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).embed_boxed(texts).await
    }
}

// ---------------------------------------------------------------------------
// HashEmbedding
// ---------------------------------------------------------------------------

/// Deterministic hash-based embedding provider.
///
/// Components are read from the BLAKE3 extended output of the text, mapped
/// into `[-1, 1]`, then the vector is L2-normalised. The digest is fixed by
/// the BLAKE3 format, so vectors persisted by one build still match queries
/// embedded by another. Identical texts always map to identical vectors;
/// different texts map to nearly orthogonal ones.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn hash_to_vector(&self, text: &str) -> Embedding {
        let mut bytes = vec![0u8; self.dimensions * 8];
        blake3::Hasher::new()
            .update(text.as_bytes())
            .finalize_xof()
            .fill(&mut bytes);

        let mut result: Embedding = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                word_to_component(u64::from_le_bytes(word))
            })
            .collect();

        let norm: f64 = result.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

fn word_to_component(word: u64) -> f64 {
    ((word as f64) / (u64::MAX as f64)) * 2.0 - 1.0
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if self.dimensions == 0 {
            return Err(QuiverError::provider("hash embedding has zero dimensions"));
        }
        Ok(texts.iter().map(|t| self.hash_to_vector(t)).collect())
    }
}
