//! Immutable in-memory vector index using cosine similarity.
//!
//! [`VectorIndex`] is built once from embedded chunks and is read-only
//! afterwards, so it can be shared across concurrent queries behind an `Arc`
//! without locking. Search is an exact linear scan, which is adequate for
//! corpora in the tens to low thousands of chunks.

use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// An immutable collection of embedded chunks with similarity search.
///
/// The index records the identity of the embedding model that produced its
/// vectors. Callers embedding a query must check it with
/// [`ensure_model`](VectorIndex::ensure_model) before searching.
///
/// # Example
///
/// ```rust,ignore
/// use gutrag::VectorIndex;
///
/// let index = VectorIndex::build(embedder.model_id(), embedder.dimensions(), chunks)?;
/// let results = index.search(&query_embedding, 3)?;
/// ```
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model_id: String,
    dimensions: usize,
    entries: Vec<Chunk>,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    /// Build the index from chunks whose embeddings are already attached.
    ///
    /// Chunk order is kept as insertion order and breaks score ties at search
    /// time. An empty chunk list yields a valid, empty index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if `dimensions` is zero and
    /// [`RagError::DimensionMismatch`] if any chunk's embedding does not have
    /// `dimensions` components.
    pub fn build(
        model_id: impl Into<String>,
        dimensions: usize,
        chunks: Vec<Chunk>,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::IndexError("dimensions must be greater than zero".to_string()));
        }
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            });
        }

        let model_id = model_id.into();
        info!(model = %model_id, dimensions, chunk_count = chunks.len(), "built vector index");
        Ok(Self { model_id, dimensions, entries: chunks })
    }

    /// Identity of the embedding model the index was built with.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Dimensionality of every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.entries
    }

    /// Fail with [`RagError::EmbeddingModelMismatch`] unless `model_id` is the
    /// model this index was built with.
    pub fn ensure_model(&self, model_id: &str) -> Result<()> {
        if self.model_id != model_id {
            return Err(RagError::EmbeddingModelMismatch {
                index_model: self.model_id.clone(),
                query_model: model_id.to_string(),
            });
        }
        Ok(())
    }

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns at most `top_k` results ordered by descending cosine
    /// similarity; equal scores keep insertion order. If the index holds fewer
    /// than `top_k` chunks, all of them are returned.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if `top_k` is zero and
    /// [`RagError::DimensionMismatch`] if the query vector has the wrong size.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::IndexError("top_k must be at least 1".to_string()));
        }
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&chunk.embedding, embedding)))
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        debug!(top_k, result_count = scored.len(), "searched vector index");

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.entries[i].clone(), score })
            .collect())
    }
}
