//! Telemetry and structured logging for Framescribe.
//!
//! Console output for interactive runs, rolling NDJSON files for the
//! record, and credential scrubbing for anything user-supplied.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_credentials;
