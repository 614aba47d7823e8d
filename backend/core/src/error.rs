use thiserror::Error;

/// Top-level error type for the Framescribe runtime.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("frame index {index} out of range (video has {frame_count} frames)")]
    OutOfRange { index: usize, frame_count: usize },

    #[error("capability unavailable ({capability}): {message}")]
    Unavailable { capability: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScribeError {
    /// Shorthand for a capability failure.
    pub fn unavailable(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from an external capability rather than the caller.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = ScribeError::OutOfRange {
            index: 5,
            frame_count: 5,
        };
        assert_eq!(
            err.to_string(),
            "frame index 5 out of range (video has 5 frames)"
        );
    }

    #[test]
    fn unavailable_shorthand() {
        let err = ScribeError::unavailable("language", "timed out");
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "capability unavailable (language): timed out");
    }
}
