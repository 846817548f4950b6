use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ask the gut health knowledge base questions.
#[derive(Debug, Parser)]
#[command(name = "gutrag", version, about = "Gut health coach backed by retrieval-augmented answers")]
pub struct Cli {
    /// JSON corpus of {instruction, response} records
    #[arg(long, env = "GUTRAG_CORPUS", default_value = "cleaned_json.json")]
    pub corpus: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long, env = "GUTRAG_CHUNK_SIZE", default_value_t = 300)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "GUTRAG_CHUNK_OVERLAP", default_value_t = 30)]
    pub chunk_overlap: usize,

    /// Embedding dimensions (hashing embedder, or Matryoshka size for remote models)
    #[arg(long, env = "GUTRAG_EMBEDDING_DIMENSIONS")]
    pub dimensions: Option<usize>,

    /// API key for an OpenAI-compatible server
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible server
    #[arg(long, env = "GUTRAG_OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Remote embedding model; the local hashing embedder is used when unset
    #[arg(long, env = "GUTRAG_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Remote generation model; answers are extracted from the corpus when unset
    #[arg(long, env = "GUTRAG_GENERATION_MODEL")]
    pub generation_model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer one or more questions
    Ask {
        /// Questions to answer, each independently
        #[arg(required = true)]
        questions: Vec<String>,
    },
    /// Answer questions interactively until EOF
    Repl,
    /// Print a summary of the built index
    Stats,
}
