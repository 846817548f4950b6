//! Loading the instruction/response corpus.
//!
//! The corpus is a JSON array of records with string fields `instruction`
//! and `response`. Any other fields are ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use crate::document::Document;
use crate::error::{RagError, Result};

#[derive(Deserialize)]
struct CorpusRecord {
    instruction: String,
    response: String,
}

/// Read and parse the corpus file at `path`.
///
/// # Errors
///
/// Returns [`RagError::CorpusUnavailable`] if the file cannot be read and
/// [`RagError::CorpusFormat`] if it is not a list of records.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read corpus");
        RagError::CorpusUnavailable { path: path.display().to_string(), message: e.to_string() }
    })?;
    let documents = parse_corpus(&raw)?;
    info!(path = %path.display(), document_count = documents.len(), "loaded corpus");
    Ok(documents)
}

/// Parse corpus records from a JSON string.
///
/// Documents are numbered in file order, which later fixes the chunk order
/// used to break similarity ties.
pub fn parse_corpus(raw: &str) -> Result<Vec<Document>> {
    let records: Vec<CorpusRecord> =
        serde_json::from_str(raw).map_err(|e| RagError::CorpusFormat(e.to_string()))?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, r)| Document::new(format!("doc_{i}"), r.instruction, r.response))
        .collect())
}
