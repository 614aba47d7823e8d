//! Log Redaction Layer
//!
//! Scrubs API keys and bearer tokens from strings prior to logging.
//! Uploaded filenames and extracted text pass through untouched.

use regex::Regex;
use std::sync::LazyLock;

static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{35}").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&]key=)[^&\s]+").unwrap());

/// Redacts credential patterns in a string.
pub fn redact_credentials(input: &str) -> String {
    let mut redacted = input.to_string();

    redacted = GOOGLE_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .to_string();
    redacted = TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();
    redacted = KEY_PARAM_RE
        .replace_all(&redacted, "${1}[REDACTED_KEY]")
        .to_string();

    redacted
}
