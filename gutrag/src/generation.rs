//! Text generation capability and prompt construction.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::document::SearchResult;
use crate::error::Result;

/// A model that turns a prompt into text.
///
/// Implementations are not assumed to be reentrant. Wrap them in
/// [`SingleFlightGenerator`] before sharing across concurrent queries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name for logs, e.g. `openai/gpt-4o-mini`.
    fn name(&self) -> &str;
}

/// Serializes access to an inner [`TextGenerator`]: at most one generation
/// call is in flight at any time, and others wait their turn.
pub struct SingleFlightGenerator {
    inner: Arc<dyn TextGenerator>,
    gate: Mutex<()>,
}

impl SingleFlightGenerator {
    /// Wrap `inner` so calls into it never overlap.
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self { inner, gate: Mutex::new(()) }
    }
}

#[async_trait]
impl TextGenerator for SingleFlightGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let _permit = self.gate.lock().await;
        debug!(generator = self.inner.name(), prompt_len = prompt.len(), "generating");
        self.inner.generate(prompt).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// The fixed question-answering prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

/// Default template; `{context}` and `{question}` are substituted.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Answer the question based on the context provided about gut health.
Context: {context}
Question: {question}
Answer:";

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_PROMPT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Use a custom template containing `{context}` and `{question}`.
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Render the prompt with retrieved chunk texts as context.
    ///
    /// Chunk texts are joined with blank lines, in retrieval order.
    pub fn render(&self, retrieved: &[SearchResult], question: &str) -> String {
        let context =
            retrieved.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        self.template.replace("{context}", &context).replace("{question}", question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use crate::error::RagError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "doc_0_0".into(),
                text: text.into(),
                document_id: "doc_0".into(),
                position: 0,
                embedding: Vec::new(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn renders_context_and_question() {
        let prompt = PromptTemplate::default()
            .render(&[result("Q: a\nA: b"), result("Q: c\nA: d")], "What is c?");
        assert_eq!(
            prompt,
            "Answer the question based on the context provided about gut health.\n\
             Context: Q: a\nA: b\n\nQ: c\nA: d\n\
             Question: What is c?\n\
             Answer:"
        );
    }

    /// Records the peak number of overlapping calls.
    struct ConcurrencyProbe {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for ConcurrencyProbe {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok("ok".into())
        }

        fn name(&self) -> &str {
            "probe"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_flight_never_overlaps_calls() {
        let probe =
            Arc::new(ConcurrencyProbe { active: AtomicUsize::new(0), peak: AtomicUsize::new(0) });
        let generator = Arc::new(SingleFlightGenerator::new(probe.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                tokio::spawn(async move { generator.generate("p").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "ok");
        }
        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(RagError::GenerationError { provider: "broken".into(), message: "boom".into() })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn single_flight_passes_errors_through() {
        let generator = SingleFlightGenerator::new(Arc::new(Broken));
        assert!(generator.generate("p").await.is_err());
        assert_eq!(generator.name(), "broken");
    }
}
