//! # gutrag
//!
//! Retrieval-augmented question answering over a small curated corpus of
//! question/answer records.
//!
//! ## Overview
//!
//! The corpus is loaded once, split into overlapping character windows,
//! embedded, and held in an immutable [`VectorIndex`]. Each query is embedded
//! with the same model, the closest chunks are retrieved, and an answer is
//! synthesized from them in one of two modes fixed at construction:
//!
//! - **generative** — a [`TextGenerator`] answers from the retrieved context
//! - **extractive** — the answer text of the best-matching chunk is returned
//!
//! Every query yields an [`Outcome`]; per-query failures become apology or
//! guidance text rather than errors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gutrag::{HashingEmbeddingProvider, RagConfig, RagEngine, load_corpus};
//!
//! let engine = RagEngine::builder()
//!     .config(RagConfig::default())
//!     .documents(load_corpus("cleaned_json.json")?)
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::new(384)?))
//!     .build()
//!     .await?;
//!
//! println!("{}", engine.answer("What is gut health?").await.text());
//! ```
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI-compatible embedding and chat-completion providers |

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod index;
pub mod retriever;
pub mod synthesis;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use corpus::{load_corpus, parse_corpus};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{RagEngine, RagEngineBuilder, SynthesisMode, build_index};
pub use error::{RagError, Result};
pub use generation::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate, SingleFlightGenerator, TextGenerator};
pub use hashing::HashingEmbeddingProvider;
pub use index::VectorIndex;
pub use retriever::Retriever;
pub use synthesis::{
    ExtractiveSynthesizer, FORMATTING_GUIDANCE, FailoverSynthesizer, GENERATION_APOLOGY,
    GenerativeSynthesizer, NO_RESULTS_GUIDANCE, Outcome, RETRIEVAL_APOLOGY, Synthesizer,
    extract_generated_answer,
};

#[cfg(feature = "openai")]
pub use openai::{OpenAIEmbeddingProvider, OpenAIGenerator};
