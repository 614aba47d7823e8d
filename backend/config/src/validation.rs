//! Config validation: catches values that would misbehave at runtime
//! rather than failing loudly at load.

use crate::schema::FramescribeConfig;

/// A single validation problem, anchored to its config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a loaded config, returning every problem found.
pub fn validate(config: &FramescribeConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if !(0.0..=1.0).contains(&config.model.temperature) {
        issues.push(ConfigIssue::new(
            "model.temperature",
            format!("must be in [0, 1], got {}", config.model.temperature),
        ));
    }
    if config.model.name.trim().is_empty() {
        issues.push(ConfigIssue::new("model.name", "must not be empty"));
    }
    if config.ocr.languages.is_empty() {
        issues.push(ConfigIssue::new(
            "ocr.languages",
            "at least one recognition language is required",
        ));
    }
    if config.session.timeout_minutes == 0 {
        issues.push(ConfigIssue::new(
            "session.timeoutMinutes",
            "must be positive",
        ));
    }
    if config.memory.max_token_limit == 0 {
        issues.push(ConfigIssue::new(
            "memory.maxTokenLimit",
            "must be positive",
        ));
    }
    if config.uploads.max_video_bytes == 0 {
        issues.push(ConfigIssue::new(
            "uploads.maxVideoBytes",
            "must be positive",
        ));
    }
    if config.capability.deadline_secs == 0 {
        issues.push(ConfigIssue::new(
            "capability.deadlineSecs",
            "must be positive",
        ));
    }

    issues
}
