//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A question/answer record from the curated corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Identifier assigned at load time (`doc_{position}`).
    pub id: String,
    /// The question text.
    pub instruction: String,
    /// The answer text.
    pub response: String,
}

impl Document {
    /// Create a document from a question and its answer.
    pub fn new(
        id: impl Into<String>,
        instruction: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), instruction: instruction.into(), response: response.into() }
    }

    /// The single text unit that gets chunked: `"Q: <instruction>\nA: <response>"`.
    pub fn canonical_text(&self) -> String {
        format!("Q: {}\nA: {}", self.instruction, self.response)
    }
}

/// A window of a [`Document`]'s canonical text with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{document_id}_{position}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Left-to-right position of this window within its document.
    pub position: usize,
    /// The vector embedding for this chunk's text. Empty until embedded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}
