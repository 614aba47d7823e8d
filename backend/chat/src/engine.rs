use std::sync::Arc;
use std::time::Duration;

use framescribe_core::deadline::DEFAULT_DEADLINE;
use framescribe_core::{with_deadline, LanguageModel};
use framescribe_memory::SummaryBufferMemory;
use tracing::{debug, warn};

use crate::prompt::{render_prompt, FALLBACK_TEXT};

/// Turns a user query plus the session's memory context into one answer.
///
/// Side-effect-free apart from the language call: the caller appends the
/// (query, answer) pair to the transcript and memory afterwards, so a
/// failed request leaves no partial state behind.
pub struct ConversationEngine {
    llm: Arc<dyn LanguageModel>,
    deadline: Duration,
}

impl ConversationEngine {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The provider behind this engine, shared with memory summarization.
    pub fn model(&self) -> &dyn LanguageModel {
        self.llm.as_ref()
    }

    /// Answer `query` in the context held by `memory`.
    ///
    /// A capability failure (or empty output) degrades to the fixed
    /// fallback text; it never surfaces as an error.
    pub async fn respond(&self, query: &str, memory: &SummaryBufferMemory) -> String {
        let history = memory.load();
        let prompt = render_prompt(&history, query);
        debug!(provider = self.llm.name(), prompt_chars = prompt.len(), "Sending chat prompt");

        match with_deadline("language", self.deadline, self.llm.generate(&prompt)).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                warn!(provider = self.llm.name(), "Empty model output; returning fallback");
                FALLBACK_TEXT.to_string()
            }
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "Language capability failed; returning fallback");
                FALLBACK_TEXT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    #[tokio::test]
    async fn returns_model_output() {
        let llm = Arc::new(MockProvider::new("mock").with_response("improved text"));
        let engine = ConversationEngine::new(llm);
        let memory = SummaryBufferMemory::new(1000);
        assert_eq!(engine.respond("fix it", &memory).await, "improved text");
    }

    #[tokio::test]
    async fn failure_degrades_to_fallback() {
        let llm = Arc::new(MockProvider::failing("mock"));
        let engine = ConversationEngine::new(llm);
        let memory = SummaryBufferMemory::new(1000);
        assert_eq!(engine.respond("fix it", &memory).await, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn empty_output_degrades_to_fallback() {
        let llm = Arc::new(MockProvider::new("mock").with_response("   "));
        let engine = ConversationEngine::new(llm);
        let memory = SummaryBufferMemory::new(1000);
        assert_eq!(engine.respond("fix it", &memory).await, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn memory_context_reaches_the_model() {
        let llm = Arc::new(MockProvider::new("mock").echoing());
        let engine = ConversationEngine::new(Arc::clone(&llm) as Arc<dyn LanguageModel>);
        let mut memory = SummaryBufferMemory::new(1000);
        memory.append("earlier question", "earlier answer", llm.as_ref()).await;

        let echoed = engine.respond("new question", &memory).await;
        assert!(echoed.contains("Human: earlier question"));
        assert!(echoed.contains("AI: earlier answer"));
        assert!(echoed.contains("Human: new question"));
    }
}
