//! Answer synthesis strategies.
//!
//! A [`Synthesizer`] turns a query and its retrieved chunks into an
//! [`Outcome`]. Two strategies cover the normal modes of operation:
//!
//! - [`GenerativeSynthesizer`] — conditions a generation model on the
//!   retrieved context
//! - [`ExtractiveSynthesizer`] — returns the answer text of the best-matching
//!   chunk directly, for when no generation model is available
//!
//! [`FailoverSynthesizer`] combines the two, extracting an answer whenever a
//! generation call fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::document::SearchResult;
use crate::error::Result;
use crate::generation::{PromptTemplate, SingleFlightGenerator, TextGenerator};

/// Returned when the generation model fails for a query.
pub const GENERATION_APOLOGY: &str = "I apologize, but I encountered an error while processing your question. Please try rephrasing your query.";

/// Returned when the query could not be embedded or searched.
pub const RETRIEVAL_APOLOGY: &str =
    "I encountered an error while searching for information. Please try again.";

/// Returned when nothing relevant was retrieved.
pub const NO_RESULTS_GUIDANCE: &str = "I couldn't find specific information about that topic in my gut health knowledge base. Please try asking about general gut health, probiotics, diet, or digestive issues.";

/// Returned when chunks were retrieved but none carried an answer marker.
pub const FORMATTING_GUIDANCE: &str = "I found some information but couldn't format it properly. Please try rephrasing your question.";

const ANSWER_MARKER: &str = "A:";

/// The result of answering one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Outcome {
    /// An answer produced from the knowledge base.
    Synthesized(String),
    /// A fixed apology after a per-query failure.
    Apology(String),
    /// Fixed guidance when no answer could be formed from what was retrieved.
    Guidance(String),
}

impl Outcome {
    /// The user-facing text, whatever the variant.
    pub fn text(&self) -> &str {
        match self {
            Self::Synthesized(text) | Self::Apology(text) | Self::Guidance(text) => text,
        }
    }

    /// Consume the outcome, returning its text.
    pub fn into_text(self) -> String {
        match self {
            Self::Synthesized(text) | Self::Apology(text) | Self::Guidance(text) => text,
        }
    }

    /// Whether this is a fixed apology or guidance message rather than an answer.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Synthesized(_))
    }
}

/// A strategy that produces an answer from retrieved chunks.
///
/// Implementations never fail: degraded results are reported as
/// [`Outcome::Apology`] or [`Outcome::Guidance`].
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// How many chunks this strategy wants retrieved per query.
    fn top_k(&self) -> usize;

    /// Produce an answer for `query` from `retrieved`, best match first.
    async fn synthesize(&self, query: &str, retrieved: &[SearchResult]) -> Outcome;
}

/// Answers by prompting a generation model with the retrieved context.
///
/// The generator is always wrapped in a [`SingleFlightGenerator`].
pub struct GenerativeSynthesizer {
    generator: SingleFlightGenerator,
    template: PromptTemplate,
    top_k: usize,
}

impl GenerativeSynthesizer {
    /// Create a synthesizer that passes `top_k` chunks to `generator`.
    pub fn new(generator: Arc<dyn TextGenerator>, top_k: usize) -> Self {
        Self {
            generator: SingleFlightGenerator::new(generator),
            template: PromptTemplate::default(),
            top_k,
        }
    }

    /// Replace the default prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Generate and post-process an answer, surfacing generation errors.
    ///
    /// # Errors
    ///
    /// Returns whatever error the generation model reports.
    pub async fn generate_answer(&self, query: &str, retrieved: &[SearchResult]) -> Result<String> {
        let prompt = self.template.render(retrieved, query);
        let raw = self.generator.generate(&prompt).await?;
        Ok(extract_generated_answer(&raw))
    }
}

#[async_trait]
impl Synthesizer for GenerativeSynthesizer {
    fn top_k(&self) -> usize {
        self.top_k
    }

    async fn synthesize(&self, query: &str, retrieved: &[SearchResult]) -> Outcome {
        match self.generate_answer(query, retrieved).await {
            Ok(answer) => Outcome::Synthesized(answer),
            Err(e) => {
                error!(generator = self.generator.name(), error = %e, "error generating response");
                Outcome::Apology(GENERATION_APOLOGY.to_string())
            }
        }
    }
}

/// Strip an echoed prompt template from raw model output.
///
/// If the output contains both `Context:` and `Question:`, everything before
/// the first line starting with `Answer:` is dropped, and the rest of that
/// line plus every following non-empty line are joined with single spaces.
/// When the echo sits on one line, the text after the first `Answer:`
/// following `Question:` is used instead. Otherwise the output is returned
/// trimmed.
pub fn extract_generated_answer(raw: &str) -> String {
    if !(raw.contains("Context:") && raw.contains("Question:")) {
        return raw.trim().to_string();
    }

    let mut started = false;
    let mut answer_lines = Vec::new();
    for line in raw.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Answer:") {
            started = true;
            let rest = rest.trim();
            if !rest.is_empty() {
                answer_lines.push(rest);
            }
        } else if started && !line.is_empty() {
            answer_lines.push(line);
        }
    }
    if !answer_lines.is_empty() {
        return answer_lines.join(" ");
    }

    if let Some(question_at) = raw.find("Question:") {
        if let Some((_, after)) = raw[question_at..].split_once("Answer:") {
            let inline = after.split_whitespace().collect::<Vec<_>>().join(" ");
            if !inline.is_empty() {
                return inline;
            }
        }
    }

    raw.trim().to_string()
}

/// Answers by extracting the text after `A:` from the best-matching chunk.
#[derive(Debug, Clone, Copy)]
pub struct ExtractiveSynthesizer {
    top_k: usize,
}

impl ExtractiveSynthesizer {
    /// Create a synthesizer that scans the `top_k` best chunks.
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

/// The trimmed text after the first `A:` marker. May be empty.
fn extract_marked_answer(text: &str) -> Option<&str> {
    text.trim().split_once(ANSWER_MARKER).map(|(_, answer)| answer.trim())
}

#[async_trait]
impl Synthesizer for ExtractiveSynthesizer {
    fn top_k(&self) -> usize {
        self.top_k
    }

    async fn synthesize(&self, _query: &str, retrieved: &[SearchResult]) -> Outcome {
        if retrieved.is_empty() {
            return Outcome::Guidance(NO_RESULTS_GUIDANCE.to_string());
        }

        match retrieved.iter().find_map(|r| extract_marked_answer(&r.chunk.text)) {
            Some(answer) => Outcome::Synthesized(answer.to_string()),
            None => {
                warn!(chunk_count = retrieved.len(), "no retrieved chunk carried an answer marker");
                Outcome::Guidance(FORMATTING_GUIDANCE.to_string())
            }
        }
    }
}

/// Generates when it can and extracts when generation fails.
///
/// Unlike the fixed modes, this re-evaluates per query: a failed generation
/// call falls through to extraction over the same retrieved chunks instead of
/// returning an apology.
pub struct FailoverSynthesizer {
    generative: GenerativeSynthesizer,
    extractive: ExtractiveSynthesizer,
}

impl FailoverSynthesizer {
    /// Combine a primary generative strategy with an extractive fallback.
    pub fn new(generative: GenerativeSynthesizer, extractive: ExtractiveSynthesizer) -> Self {
        Self { generative, extractive }
    }
}

#[async_trait]
impl Synthesizer for FailoverSynthesizer {
    fn top_k(&self) -> usize {
        self.generative.top_k().max(self.extractive.top_k())
    }

    async fn synthesize(&self, query: &str, retrieved: &[SearchResult]) -> Outcome {
        let context = &retrieved[..retrieved.len().min(self.generative.top_k())];
        match self.generative.generate_answer(query, context).await {
            Ok(answer) => Outcome::Synthesized(answer),
            Err(e) => {
                warn!(error = %e, "generation failed, extracting answer instead");
                let candidates = &retrieved[..retrieved.len().min(self.extractive.top_k())];
                self.extractive.synthesize(query, candidates).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use crate::error::RagError;
    use std::sync::Mutex;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "doc_0_0".into(),
                text: text.into(),
                document_id: "doc_0".into(),
                position: 0,
                embedding: Vec::new(),
            },
            score,
        }
    }

    /// Replies with a fixed string and remembers the last prompt.
    struct Scripted {
        reply: Option<String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl Scripted {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply.into()), last_prompt: Mutex::new(None) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: None, last_prompt: Mutex::new(None) })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone().ok_or_else(|| RagError::GenerationError {
                provider: "scripted".into(),
                message: "model crashed".into(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn plain_output_is_trimmed() {
        assert_eq!(extract_generated_answer("  Eat more fiber.\n"), "Eat more fiber.");
    }

    #[test]
    fn strips_single_line_template_echo() {
        let raw = "Context: ... Question: ... Answer: Fiber and fermented foods support gut health.";
        assert_eq!(extract_generated_answer(raw), "Fiber and fermented foods support gut health.");
    }

    #[test]
    fn strips_multi_line_template_echo() {
        let raw = "Answer the question based on the context provided about gut health.\n\
                   Context: Q: x\nA: y\n\
                   Question: What helps?\n\
                   Answer: Fiber helps.\n\
                   \n\
                   So do probiotics.\n";
        assert_eq!(extract_generated_answer(raw), "Fiber helps. So do probiotics.");
    }

    #[test]
    fn answer_on_following_lines_is_captured() {
        let raw = "Context: c\nQuestion: q\nAnswer:\n  Drink water.  \n";
        assert_eq!(extract_generated_answer(raw), "Drink water.");
    }

    #[test]
    fn outcome_accessors() {
        let outcome = Outcome::Guidance("try again".into());
        assert_eq!(outcome.text(), "try again");
        assert!(outcome.is_degraded());
        assert!(!Outcome::Synthesized("x".into()).is_degraded());
        assert_eq!(Outcome::Apology("sorry".into()).into_text(), "sorry");
    }

    #[tokio::test]
    async fn generative_uses_retrieved_context() {
        let generator = Scripted::replying("Eat fiber.");
        let synthesizer = GenerativeSynthesizer::new(generator.clone(), 3);
        let outcome = synthesizer
            .synthesize("What should I eat?", &[result("Q: diet?\nA: Eat fiber.", 0.9)])
            .await;

        assert_eq!(outcome, Outcome::Synthesized("Eat fiber.".into()));
        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Context: Q: diet?\nA: Eat fiber."));
        assert!(prompt.contains("Question: What should I eat?"));
    }

    #[tokio::test]
    async fn generation_failure_becomes_apology() {
        let synthesizer = GenerativeSynthesizer::new(Scripted::failing(), 3);
        let outcome = synthesizer.synthesize("q", &[result("Q: a\nA: b", 1.0)]).await;
        assert_eq!(outcome, Outcome::Apology(GENERATION_APOLOGY.into()));
    }

    #[tokio::test]
    async fn extractive_returns_answer_from_best_chunk() {
        let outcome = ExtractiveSynthesizer::new(2)
            .synthesize(
                "q",
                &[result("Q: first?\nA: First answer.", 0.9), result("Q: s?\nA: Second.", 0.8)],
            )
            .await;
        assert_eq!(outcome, Outcome::Synthesized("First answer.".into()));
    }

    #[tokio::test]
    async fn extractive_skips_chunks_without_marker() {
        let outcome = ExtractiveSynthesizer::new(2)
            .synthesize("q", &[result("tail of an answer", 0.9), result("Q: s?\nA: Second.", 0.8)])
            .await;
        assert_eq!(outcome, Outcome::Synthesized("Second.".into()));
    }

    #[tokio::test]
    async fn extractive_returns_empty_answer_after_bare_marker() {
        let outcome = ExtractiveSynthesizer::new(2)
            .synthesize("q", &[result("Q: x\nA: ", 0.9), result("Q: s?\nA: Second.", 0.8)])
            .await;
        assert_eq!(outcome, Outcome::Synthesized(String::new()));
    }

    #[tokio::test]
    async fn extractive_reports_unformattable_chunks() {
        let outcome =
            ExtractiveSynthesizer::new(2).synthesize("q", &[result("no marker here", 0.9)]).await;
        assert_eq!(outcome, Outcome::Guidance(FORMATTING_GUIDANCE.into()));
    }

    #[tokio::test]
    async fn extractive_guides_when_nothing_retrieved() {
        let outcome = ExtractiveSynthesizer::new(2).synthesize("q", &[]).await;
        assert_eq!(outcome, Outcome::Guidance(NO_RESULTS_GUIDANCE.into()));
    }

    #[tokio::test]
    async fn failover_extracts_when_generation_fails() {
        let synthesizer = FailoverSynthesizer::new(
            GenerativeSynthesizer::new(Scripted::failing(), 3),
            ExtractiveSynthesizer::new(2),
        );
        assert_eq!(synthesizer.top_k(), 3);
        let outcome = synthesizer.synthesize("q", &[result("Q: a\nA: Extracted.", 1.0)]).await;
        assert_eq!(outcome, Outcome::Synthesized("Extracted.".into()));
    }

    #[tokio::test]
    async fn failover_prefers_generation() {
        let synthesizer = FailoverSynthesizer::new(
            GenerativeSynthesizer::new(Scripted::replying("Generated."), 3),
            ExtractiveSynthesizer::new(2),
        );
        let outcome = synthesizer.synthesize("q", &[result("Q: a\nA: Extracted.", 1.0)]).await;
        assert_eq!(outcome, Outcome::Synthesized("Generated.".into()));
    }
}
