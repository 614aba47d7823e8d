//! Upload intake and storage for Framescribe.
//!
//! Everything user-supplied crosses this boundary: filenames are
//! sanitized, extensions checked against the image/video allow-lists,
//! video size capped, and the resulting files live in one managed
//! directory that session cleanup can sweep.

pub mod file_server;
pub mod mime_detect;
pub mod sanitize;
pub mod store;

pub use file_server::upload_router;
pub use mime_detect::{detect_mime_type, is_image, is_inline_safe, is_video};
pub use sanitize::sanitize_filename;
pub use store::{upload_kind, StoredUpload, UploadKind, UploadStore};
