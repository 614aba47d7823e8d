//! Top-level application context for Framescribe.
//!
//! Owns the one injectable instance of everything stateful (the session
//! registry, the upload store, the OCR pipeline, the conversation engine)
//! and exposes the upload/extract/refine flow the web layer drives.
//! Nothing here is a process-wide global; tests build isolated contexts.

pub mod context;

pub use context::AppContext;

use framescribe_config::FramescribeConfig;

/// Install the global tracing subscriber per the logging config.
pub fn init_telemetry(config: &FramescribeConfig) {
    logging::init_logger(&config.logging.dir, &config.logging.level);
}
