//! Error types for the `gutrag` crate.

use thiserror::Error;

/// Errors that can occur while building or querying the knowledge base.
///
/// Per-query degradations (a failed generation call, an empty retrieval, a
/// chunk without an answer marker) are not errors: they surface as
/// [`Outcome`](crate::Outcome) variants instead.
#[derive(Debug, Error)]
pub enum RagError {
    /// The corpus source is missing or unreadable.
    #[error("Corpus unavailable at {path}: {message}")]
    CorpusUnavailable {
        /// The path that was read.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The corpus was readable but not a list of instruction/response records.
    #[error("Corpus format error: {0}")]
    CorpusFormat(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The index was built with a different embedding model than the one
    /// used to embed the query.
    #[error("Embedding model mismatch: index built with '{index_model}', queried with '{query_model}'")]
    EmbeddingModelMismatch {
        /// Model identity recorded when the index was built.
        index_model: String,
        /// Model identity of the embedder used at query time.
        query_model: String,
    },

    /// A vector did not have the dimensionality the index expects.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality recorded by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The generation model failed to produce text.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// The vector index could not be built or searched.
    #[error("Index error: {0}")]
    IndexError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
