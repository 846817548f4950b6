//! Configuration for chunking and retrieval.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved as context for the generation model.
    pub generation_top_k: usize,
    /// Number of chunks considered when extracting an answer directly.
    pub extraction_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 300, chunk_overlap: 30, generation_top_k: 3, extraction_top_k: 2 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - either top-k value is zero
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.generation_top_k == 0 {
            return Err(RagError::ConfigError(
                "generation_top_k must be greater than zero".to_string(),
            ));
        }
        if self.extraction_top_k == 0 {
            return Err(RagError::ConfigError(
                "extraction_top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set how many chunks are passed to the generation model as context.
    pub fn generation_top_k(mut self, k: usize) -> Self {
        self.config.generation_top_k = k;
        self
    }

    /// Set how many chunks are scanned for an extractable answer.
    pub fn extraction_top_k(mut self, k: usize) -> Self {
        self.config.extraction_top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_knowledge_base_settings() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.chunk_overlap, 30);
        assert_eq!(config.generation_top_k, 3);
        assert_eq!(config.extraction_top_k, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(50).chunk_overlap(50).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn rejects_zero_top_k() {
        assert!(RagConfig::builder().generation_top_k(0).build().is_err());
        assert!(RagConfig::builder().extraction_top_k(0).build().is_err());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
    }
}
