//! Conversation memory for Framescribe sessions.
//!
//! Two layers with different jobs: the [`Transcript`] keeps the full,
//! append-only exchange for display, while [`SummaryBufferMemory`] keeps
//! the token-bounded view fed into each new prompt, folding older turns
//! into a running summary instead of growing without bound.

pub mod summary_buffer;
pub mod transcript;

pub use summary_buffer::{estimate_tokens, SummaryBufferMemory};
pub use transcript::Transcript;
