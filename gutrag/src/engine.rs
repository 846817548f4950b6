//! The question-answering engine.
//!
//! [`RagEngine`] is built once from the corpus (chunk → embed → index) and
//! then answers queries (retrieve → synthesize). Construction either produces
//! a fully indexed engine or an error; a partially built index is never
//! observable. The engine holds no mutable state and is shared between
//! request handlers as an `Arc<RagEngine>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use gutrag::{RagEngine, RagConfig, HashingEmbeddingProvider, load_corpus};
//!
//! let engine = RagEngine::builder()
//!     .config(RagConfig::default())
//!     .documents(load_corpus("cleaned_json.json")?)
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::new(384)?))
//!     .build()
//!     .await?;
//!
//! let outcome = engine.answer("What is gut health?").await;
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::index::VectorIndex;
use crate::retriever::Retriever;
use crate::synthesis::{
    ExtractiveSynthesizer, GenerativeSynthesizer, Outcome, RETRIEVAL_APOLOGY, Synthesizer,
};

/// How the engine produces answers. Fixed when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// A generation model answers from retrieved context.
    Generative,
    /// Answers are extracted from the best-matching chunk.
    Extractive,
    /// A caller-supplied [`Synthesizer`].
    Custom,
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generative => f.write_str("generative"),
            Self::Extractive => f.write_str("extractive"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

/// The retrieval-and-synthesis service.
///
/// Construct one via [`RagEngine::builder()`].
pub struct RagEngine {
    config: RagConfig,
    retriever: Retriever,
    synthesizer: Arc<dyn Synthesizer>,
    mode: SynthesisMode,
}

impl fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagEngine")
            .field("config", &self.config)
            .field("retriever", &self.retriever)
            .field("mode", &self.mode)
            .finish()
    }
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The synthesis mode chosen at construction.
    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.retriever.index().len()
    }

    /// Identity of the embedding model the index was built with.
    pub fn embedding_model(&self) -> &str {
        self.retriever.index().model_id()
    }

    /// Retrieve the `top_k` chunks most similar to `query`.
    ///
    /// # Errors
    ///
    /// Returns the embedding or search error; see [`Retriever::retrieve`].
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.retriever.retrieve(query, top_k).await
    }

    /// Answer a query.
    ///
    /// Never fails: a retrieval failure is logged and reported as
    /// [`Outcome::Apology`], and the synthesizer reports its own degradations.
    /// Each query is answered independently of earlier ones.
    pub async fn answer(&self, query: &str) -> Outcome {
        let retrieved = match self.retriever.retrieve(query, self.synthesizer.top_k()).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Outcome::Apology(RETRIEVAL_APOLOGY.to_string());
            }
        };

        let outcome = self.synthesizer.synthesize(query, &retrieved).await;
        info!(
            mode = %self.mode,
            retrieved = retrieved.len(),
            degraded = outcome.is_degraded(),
            "answered query"
        );
        outcome
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// `embedding_provider` is required. Without a generator the engine runs in
/// extractive mode. `documents` defaults to an empty corpus, which is valid
/// and yields guidance answers.
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    documents: Vec<Document>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    generator: Option<Arc<dyn TextGenerator>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration. Defaults to [`RagConfig::default()`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the corpus to index.
    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    /// Set the embedding provider used for both indexing and queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the chunker built from the configured size and overlap.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the generation model, selecting generative mode.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set an optional generation model.
    pub fn maybe_generator(mut self, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        self.generator = generator;
        self
    }

    /// Use a custom synthesis strategy. Takes precedence over `generator`.
    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Chunk, embed and index the corpus, producing a ready engine.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the configuration is invalid or
    /// the embedding provider is missing, and propagates chunking, embedding
    /// and index errors. No engine exists after a failure.
    pub async fn build(self) -> Result<RagEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let index = build_index(&self.documents, chunker.as_ref(), embedder.as_ref()).await?;
        let retriever = Retriever::new(Arc::new(index), embedder)?;

        let mode = match (&self.synthesizer, &self.generator) {
            (Some(_), _) => SynthesisMode::Custom,
            (None, Some(_)) => SynthesisMode::Generative,
            (None, None) => SynthesisMode::Extractive,
        };
        let synthesizer: Arc<dyn Synthesizer> = match (self.synthesizer, self.generator) {
            (Some(custom), _) => custom,
            (None, Some(generator)) => {
                Arc::new(GenerativeSynthesizer::new(generator, config.generation_top_k))
            }
            (None, None) => Arc::new(ExtractiveSynthesizer::new(config.extraction_top_k)),
        };

        info!(
            %mode,
            document_count = self.documents.len(),
            chunk_count = retriever.index().len(),
            "RAG engine initialized"
        );

        Ok(RagEngine { config, retriever, synthesizer, mode })
    }
}

/// Chunk every document, embed every chunk, and build the index.
///
/// # Errors
///
/// Returns [`RagError::EmbeddingError`] if the provider fails or returns the
/// wrong number of vectors, and propagates [`VectorIndex::build`] errors.
pub async fn build_index(
    documents: &[Document],
    chunker: &dyn Chunker,
    embedder: &dyn EmbeddingProvider,
) -> Result<VectorIndex> {
    info!(document_count = documents.len(), "building vector store");
    let mut chunks: Vec<Chunk> = chunker.chunk_all(documents);

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await.inspect_err(|e| {
        error!(error = %e, "embedding failed during indexing");
    })?;
    if embeddings.len() != chunks.len() {
        return Err(RagError::EmbeddingError {
            provider: embedder.model_id().to_string(),
            message: format!(
                "expected {} embeddings, provider returned {}",
                chunks.len(),
                embeddings.len()
            ),
        });
    }

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }

    VectorIndex::build(embedder.model_id(), embedder.dimensions(), chunks)
}
