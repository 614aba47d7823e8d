//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Pattern matching valid uppercase env var names.
static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Walks the entire value tree recursively; only string leaves are
/// processed. Returns an error if any referenced env var is unset or empty.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        // Primitives pass through unchanged.
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures<'_>| {
        let var_name = &caps[1];
        match env.get(var_name) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => {
                if missing.is_none() {
                    missing = Some(MissingEnvVarError {
                        var_name: var_name.to_string(),
                        config_path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        return Err(err.into());
    }
    Ok(substituted.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_string_leaves() {
        let value = json!({ "model": { "apiKey": "${AI_API_TOKEN}" } });
        let resolved =
            resolve_env_vars_with(&value, &env(&[("AI_API_TOKEN", "tok-123")])).unwrap();
        assert_eq!(resolved["model"]["apiKey"], "tok-123");
    }

    #[test]
    fn missing_var_names_config_path() {
        let value = json!({ "model": { "apiKey": "${AI_API_TOKEN}" } });
        let err = resolve_env_vars_with(&value, &env(&[])).unwrap_err();
        assert!(err.to_string().contains("AI_API_TOKEN"));
        assert!(err.to_string().contains("model.apiKey"));
    }

    #[test]
    fn lowercase_names_are_not_substituted() {
        let value = json!({ "note": "${not_a_var}" });
        let resolved = resolve_env_vars_with(&value, &env(&[])).unwrap();
        assert_eq!(resolved["note"], "${not_a_var}");
    }

    #[test]
    fn non_string_leaves_untouched() {
        let value = json!({ "memory": { "maxTokenLimit": 4096 } });
        let resolved = resolve_env_vars_with(&value, &env(&[])).unwrap();
        assert_eq!(resolved["memory"]["maxTokenLimit"], 4096);
    }
}
