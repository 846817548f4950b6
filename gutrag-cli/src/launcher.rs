//! Engine start-up and command dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use gutrag::{
    EmbeddingProvider, HashingEmbeddingProvider, OpenAIEmbeddingProvider, OpenAIGenerator,
    Outcome, RagConfig, RagEngine, TextGenerator, load_corpus,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command};

/// Matches the sentence-embedding size the corpus was originally indexed with.
const DEFAULT_DIMENSIONS: usize = 384;

/// Appended to answers drawn from the knowledge base.
pub const DISCLAIMER: &str = "Note: This advice is for informational purposes only. Please consult with a healthcare professional for personalized medical advice.";

/// Render an outcome for the user. Only real answers carry the disclaimer.
pub fn render(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Synthesized(text) if !text.is_empty() => format!("{text}\n\n{DISCLAIMER}"),
        other => other.text().to_string(),
    }
}

fn embedding_provider(cli: &Cli) -> Result<Arc<dyn EmbeddingProvider>> {
    let Some(model) = &cli.embedding_model else {
        let dimensions = cli.dimensions.unwrap_or(DEFAULT_DIMENSIONS);
        return Ok(Arc::new(HashingEmbeddingProvider::new(dimensions)?));
    };

    let api_key = cli.api_key.clone().context("an API key is required for remote embeddings")?;
    let mut provider = OpenAIEmbeddingProvider::new(api_key)?.with_model(model);
    if let Some(base_url) = &cli.base_url {
        provider = provider.with_base_url(base_url);
    }
    if let Some(dimensions) = cli.dimensions {
        provider = provider.with_dimensions(dimensions);
    }
    Ok(Arc::new(provider))
}

/// Load the generation model if one is configured. Failure is not fatal:
/// the engine then answers by extraction.
fn generator(cli: &Cli) -> Option<Arc<dyn TextGenerator>> {
    let model = cli.generation_model.as_ref()?;
    let api_key = cli.api_key.clone().unwrap_or_default();
    match OpenAIGenerator::new(api_key, model) {
        Ok(generator) => {
            let generator = match &cli.base_url {
                Some(base_url) => generator.with_base_url(base_url),
                None => generator,
            };
            Some(Arc::new(generator))
        }
        Err(e) => {
            warn!(error = %e, "could not initialize generation model, using simple retrieval");
            None
        }
    }
}

/// Load the corpus and build the engine.
///
/// A missing corpus leaves the service unavailable.
pub async fn initialize(cli: &Cli) -> Result<RagEngine> {
    info!(corpus = %cli.corpus.display(), "initializing RAG system");

    let config = RagConfig::builder()
        .chunk_size(cli.chunk_size)
        .chunk_overlap(cli.chunk_overlap)
        .build()?;
    let documents = load_corpus(&cli.corpus).context("service unavailable: corpus not loaded")?;

    let engine = RagEngine::builder()
        .config(config)
        .documents(documents)
        .embedding_provider(embedding_provider(cli)?)
        .maybe_generator(generator(cli))
        .build()
        .await
        .context("service unavailable: failed to build knowledge base")?;

    info!(mode = %engine.mode(), chunks = engine.chunk_count(), "RAG system ready");
    Ok(engine)
}

pub async fn run(cli: Cli) -> Result<()> {
    let engine = initialize(&cli).await?;

    match cli.command {
        Command::Ask { questions } => {
            for question in questions {
                let outcome = engine.answer(&question).await;
                println!("{}\n", render(&outcome));
            }
        }
        Command::Repl => repl(&engine).await?,
        Command::Stats => {
            println!("mode:            {}", engine.mode());
            println!("chunks:          {}", engine.chunk_count());
            println!("embedding model: {}", engine.embedding_model());
            println!("chunk size:      {}", engine.config().chunk_size);
            println!("chunk overlap:   {}", engine.config().chunk_overlap);
        }
    }
    Ok(())
}

async fn repl(engine: &RagEngine) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Ask a gut health question (Ctrl-D to quit).\n");

    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(question) {
                    debug!(error = %e, "could not record history entry");
                }
                let outcome = engine.answer(question).await;
                println!("coach> {}\n", render(&outcome));
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gutrag::{NO_RESULTS_GUIDANCE, SynthesisMode};
    use std::fs;

    #[test]
    fn answers_carry_the_disclaimer() {
        let rendered = render(&Outcome::Synthesized("Eat fiber.".into()));
        assert_eq!(rendered, format!("Eat fiber.\n\n{DISCLAIMER}"));
    }

    #[test]
    fn guidance_and_apologies_do_not() {
        assert_eq!(render(&Outcome::Guidance("Try again.".into())), "Try again.");
        assert_eq!(render(&Outcome::Apology("Sorry.".into())), "Sorry.");
    }

    #[tokio::test]
    async fn missing_corpus_is_service_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing.json");
        let cli =
            Cli::try_parse_from(["gutrag", "--corpus", missing.to_str().unwrap(), "stats"]).unwrap();
        let err = initialize(&cli).await.unwrap_err();
        assert!(err.to_string().contains("service unavailable"));
    }

    #[tokio::test]
    async fn builds_extractive_engine_without_models() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("corpus.json");
        fs::write(&path, "[]").unwrap();
        let cli = Cli::try_parse_from(["gutrag", "--corpus", path.to_str().unwrap(), "stats"])
            .unwrap();

        let engine = initialize(&cli).await.unwrap();
        assert_eq!(engine.mode(), SynthesisMode::Extractive);
        assert_eq!(engine.embedding_model(), "hashing-fnv1a/384");
        assert_eq!(render(&engine.answer("anything").await), NO_RESULTS_GUIDANCE);
    }
}
