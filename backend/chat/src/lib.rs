//! Conversational refinement engine for Framescribe.
//!
//! Renders the fixed chat template around the session's memory context,
//! makes one round trip to the language capability, and keeps the
//! conversation alive with a fallback reply when that capability fails.

pub mod engine;
pub mod prompt;
pub mod providers;

pub use engine::ConversationEngine;
pub use prompt::{render_prompt, FALLBACK_TEXT};
pub use providers::{GeminiProvider, MockProvider};
