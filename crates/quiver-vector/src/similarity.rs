//! Cosine similarity over `f64` vectors.
//!
//! Vectors of different lengths are compared as if the shorter one were
//! zero-padded: indices past its end contribute nothing to the dot product
//! but still count toward the longer vector's magnitude.

use quiver_core::error::{QuiverError, Result};

/// Compute the cosine similarity between `a` and `b`.
///
/// Fails with [`QuiverError::DegenerateVector`] when either magnitude is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    let count = a.len().max(b.len());

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for k in 0..count {
        let x = a.get(k).copied().unwrap_or(0.0);
        let y = b.get(k).copied().unwrap_or(0.0);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(QuiverError::DegenerateVector);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Score `query` against every vector in `corpus`, in corpus order.
///
/// Stops at the first degenerate vector; no partial scores are returned.
pub fn cosine_similarity_batch<'a, I>(query: &[f64], corpus: I) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    corpus
        .into_iter()
        .map(|values| cosine_similarity(query, values))
        .collect()
}
