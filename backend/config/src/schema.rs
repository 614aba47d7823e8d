//! Framescribe runtime configuration schema.
//!
//! Typed for serde YAML deserialization. Every field has a default so an
//! absent config file (or a partial one) still yields a runnable config.

use serde::{Deserialize, Serialize};

/// Root configuration for Framescribe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FramescribeConfig {
    /// Language model provider settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// OCR engine settings.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Video decoder settings.
    #[serde(default)]
    pub video: VideoConfig,

    /// Session lifetime settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Upload intake settings.
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External capability call settings.
    #[serde(default)]
    pub capability: CapabilityConfig,
}

/// Language model provider configuration. Affects only the external
/// capability's behavior, never the core session logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// API key, typically supplied as `${AI_API_TOKEN}`.
    #[serde(default)]
    pub api_key: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            temperature: default_temperature(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Recognition languages, as engine language codes.
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,
    /// Directory holding the engine's trained data, if not system-wide.
    #[serde(default)]
    pub model_dir: Option<String>,
    #[serde(default = "default_ocr_binary")]
    pub binary: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_ocr_languages(),
            model_dir: None,
            binary: default_ocr_binary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    #[serde(default = "default_video_binary")]
    pub binary: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            binary: default_video_binary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Minutes from session start until the session is expired and reset.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    /// Token budget for summary plus unsummarized recent turns.
    #[serde(default = "default_max_token_limit")]
    pub max_token_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_token_limit: default_max_token_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadsConfig {
    #[serde(default = "default_uploads_dir")]
    pub dir: String,
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityConfig {
    /// Deadline in seconds for one language/OCR/decode round trip.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_ocr_languages() -> Vec<String> {
    vec!["eng".to_string(), "ara".to_string()]
}

fn default_ocr_binary() -> String {
    "tesseract".to_string()
}

fn default_video_binary() -> String {
    "ffmpeg".to_string()
}

fn default_timeout_minutes() -> u64 {
    30
}

fn default_max_token_limit() -> usize {
    4096
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_max_video_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_deadline_secs() -> u64 {
    120
}
