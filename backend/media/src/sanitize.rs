//! Filename sanitization for user uploads.
//!
//! Strips path components and collapses anything outside a conservative
//! character set, so a stored name can never escape the upload directory.

use framescribe_core::ScribeError;
use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Reduce a user-supplied filename to a safe basename.
///
/// Rejects names that sanitize down to nothing (or to dots only) with
/// `InvalidInput`.
pub fn sanitize_filename(name: &str) -> Result<String, ScribeError> {
    // Last path component only, whichever separator the client used.
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let safe = UNSAFE_CHARS.replace_all(base, "_");
    let safe = safe.trim_matches(['.', '_']).to_string();

    if safe.is_empty() {
        return Err(ScribeError::InvalidInput(format!(
            "filename {name:?} has no usable characters"
        )));
    }
    Ok(safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_filename("receipt.png").unwrap(), "receipt.png");
    }

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").unwrap(),
            "passwd"
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\x\\clip.mp4").unwrap(),
            "clip.mp4"
        );
    }

    #[test]
    fn unsafe_characters_collapse() {
        assert_eq!(
            sanitize_filename("my video (final) .mp4").unwrap(),
            "my_video_final_.mp4"
        );
    }

    #[test]
    fn dot_only_names_rejected() {
        assert!(sanitize_filename("...").is_err());
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("///").is_err());
    }
}
