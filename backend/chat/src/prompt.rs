//! Fixed chat prompt template.

/// Reply returned to the user when the language capability cannot
/// produce an answer.
pub const FALLBACK_TEXT: &str = "لم أتمكن من إنشاء استجابة.";

/// Render the chat prompt around the memory context and the new query.
pub fn render_prompt(history: &str, question: &str) -> String {
    format!(
        "You are a helpful and kind AI. Keep your answers short.\n\
         Conversation history:\n\
         {history}\n\
         Human: {question}\n\
         AI:"
    )
}
