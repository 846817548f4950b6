//! Query-time retrieval: embed the query, then search the index.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::VectorIndex;

/// Embeds queries and searches a shared [`VectorIndex`].
///
/// Holds only shared, read-only state, so one `Retriever` can serve any
/// number of concurrent queries.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index_model", &self.index.model_id())
            .field("chunk_count", &self.index.len())
            .finish()
    }
}

impl Retriever {
    /// Pair an index with the embedder used to query it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingModelMismatch`](crate::RagError::EmbeddingModelMismatch)
    /// if `embedder` is not the model the index was built with.
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        index.ensure_model(embedder.model_id()).inspect_err(|e| {
            error!(error = %e, "retriever embedder does not match index");
        })?;
        Ok(Self { index, embedder })
    }

    /// The index being searched.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Return up to `top_k` chunks most similar to `query`.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures unchanged; they are never reported as an
    /// empty result.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
        })?;
        self.index.ensure_model(self.embedder.model_id())?;

        let results = self.index.search(&embedding, top_k)?;
        debug!(query_len = query.len(), top_k, result_count = results.len(), "retrieved chunks");
        Ok(results)
    }
}
