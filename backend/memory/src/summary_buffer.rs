//! Token-bounded conversation memory with progressive summarization.
//!
//! Follows the summary-buffer scheme: a running summary of everything old,
//! plus a tail of recent raw turns. Whenever an append pushes the
//! estimated token cost of (summary + tail) over the configured limit, the
//! oldest tail turns are folded into the summary through the language
//! capability. If that call fails, the turns are dropped instead:
//! degraded, but the conversation keeps moving.

use std::collections::VecDeque;
use std::time::Duration;

use framescribe_core::{with_deadline, LanguageModel, Sender, Turn};
use framescribe_core::deadline::DEFAULT_DEADLINE;
use tracing::{debug, warn};

/// Estimated token cost of a text: one token per four characters,
/// rounded up. Monotone and deterministic; exactness is not the point.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Bounded summarizing memory for one session.
#[derive(Debug)]
pub struct SummaryBufferMemory {
    summary: String,
    recent: VecDeque<Turn>,
    max_token_limit: usize,
    deadline: Duration,
}

impl SummaryBufferMemory {
    pub fn new(max_token_limit: usize) -> Self {
        Self {
            summary: String::new(),
            recent: VecDeque::new(),
            max_token_limit,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The running summary of turns folded out of the tail so far.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The unsummarized recent turns, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Turn> {
        self.recent.iter()
    }

    /// Serialized context for prompt construction: the summary (when
    /// non-empty) followed by the recent turns, chronological order.
    pub fn load(&self) -> String {
        let mut lines = Vec::with_capacity(self.recent.len() + 1);
        if !self.summary.is_empty() {
            lines.push(self.summary.clone());
        }
        lines.extend(self.recent.iter().map(render_turn));
        lines.join("\n")
    }

    /// Append one (user, ai) exchange, then compress back under the token
    /// limit by folding the oldest turns into the summary.
    pub async fn append(&mut self, user_text: &str, ai_text: &str, llm: &dyn LanguageModel) {
        self.recent.push_back(Turn::user(user_text));
        self.recent.push_back(Turn::ai(ai_text));

        // Folding may itself grow the summary past the limit, so the
        // whole pass repeats until the context fits or the tail is empty.
        // Each pass pops at least one turn, so this terminates; even a
        // single turn exceeding the limit on its own is still folded.
        loop {
            if self.context_tokens() <= self.max_token_limit {
                return;
            }

            // Oldest-first, never reordered.
            let mut folded = Vec::new();
            while self.context_tokens() > self.max_token_limit {
                let Some(turn) = self.recent.pop_front() else {
                    break;
                };
                folded.push(turn);
            }

            if folded.is_empty() {
                // Tail exhausted; the summary alone is over the limit and
                // there is nothing left to fold into it.
                return;
            }

            let prompt = summary_prompt(&self.summary, &folded);
            match with_deadline("language", self.deadline, llm.generate(&prompt)).await {
                Ok(new_summary) if !new_summary.trim().is_empty() => {
                    debug!(
                        folded = folded.len(),
                        summary_tokens = estimate_tokens(new_summary.trim()),
                        "Folded oldest turns into summary"
                    );
                    self.summary = new_summary.trim().to_string();
                }
                Ok(_) => {
                    warn!(
                        dropped = folded.len(),
                        "Summarizer returned empty text; dropping oldest turns"
                    );
                }
                Err(e) => {
                    warn!(
                        dropped = folded.len(),
                        error = %e,
                        "Summarization failed; dropping oldest turns"
                    );
                }
            }
        }
    }

    fn context_tokens(&self) -> usize {
        estimate_tokens(&self.load())
    }
}

fn render_turn(turn: &Turn) -> String {
    match turn.sender {
        Sender::User => format!("Human: {}", turn.message),
        Sender::Ai => format!("AI: {}", turn.message),
    }
}

fn summary_prompt(current_summary: &str, turns: &[Turn]) -> String {
    let lines = turns.iter().map(render_turn).collect::<Vec<_>>().join("\n");
    format!(
        "Progressively summarize the lines of conversation provided, \
         adding onto the previous summary and returning a new summary.\n\n\
         Current summary:\n{current_summary}\n\n\
         New lines of conversation:\n{lines}\n\n\
         New summary:"
    )
}
