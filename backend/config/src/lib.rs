//! `framescribe-config`: Framescribe runtime configuration management.
//!
//! Provides:
//! - Typed config schema (model, OCR, sessions, memory, uploads, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - Default value application for absent or partial files
//! - Validation with config-path-anchored diagnostics

pub mod env;
pub mod schema;
pub mod validation;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use schema::{
    CapabilityConfig, FramescribeConfig, LoggingConfig, MemoryConfig, ModelConfig, OcrConfig,
    SessionConfig, UploadsConfig, VideoConfig,
};
pub use validation::{validate, ConfigIssue};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load a config file, substitute env vars, validate, and return the
/// typed config. An absent file yields the defaults.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<FramescribeConfig> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No config file; using defaults");
            return Ok(FramescribeConfig::default());
        }
        Err(e) => return Err(e).context(format!("Failed to read config {}", path.display())),
    };

    let value: serde_json::Value =
        serde_yaml::from_str(&raw).context("Failed to parse config YAML")?;

    // Substitute ${VAR} env vars before typed deserialization.
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: FramescribeConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;

    let issues = validate(&config);
    for issue in &issues {
        tracing::error!(path = %issue.path, message = %issue.message, "Config error");
    }
    if !issues.is_empty() {
        bail!("config validation failed with {} error(s)", issues.len());
    }

    Ok(config)
}
