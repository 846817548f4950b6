//! Document chunking.
//!
//! Documents are split into overlapping fixed-size character windows. Window
//! boundaries may fall mid-word; sentence-aware splitting is not attempted.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and positions but no
/// embeddings. Embeddings are attached later when the index is built.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks, in left-to-right order.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split every document, preserving document order and window order.
    ///
    /// Overlap is never carried across document boundaries.
    fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits canonical document text into windows of at most `chunk_size`
/// characters, advancing by `chunk_size - chunk_overlap` each step.
///
/// Chunk IDs are generated as `{document_id}_{position}`.
///
/// # Example
///
/// ```rust,ignore
/// use gutrag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(300, 30)?;
/// let chunks = chunker.chunk_all(&documents);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] unless `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::ChunkingError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.canonical_text();

        // Byte offset of every char boundary, so windows are counted in
        // characters and never split a code point.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut position = 0;

        loop {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(Chunk {
                id: format!("{}_{position}", document.id),
                text: text[boundaries[start]..boundaries[end]].to_string(),
                document_id: document.id.clone(),
                position,
                embedding: Vec::new(),
            });

            if end == char_count {
                break;
            }
            start += step;
            position += 1;
        }

        chunks
    }
}
