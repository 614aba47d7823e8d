//! The managed upload directory.

use std::path::{Path, PathBuf};

use framescribe_core::ScribeError;
use tracing::{info, warn};

use crate::sanitize::sanitize_filename;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// What kind of upload a filename's extension admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Video,
}

/// Classify a filename by its extension against the allow-lists.
pub fn upload_kind(name: &str) -> Option<UploadKind> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(UploadKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(UploadKind::Video)
    } else {
        None
    }
}

/// A successfully stored upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub name: String,
    pub path: PathBuf,
    pub kind: UploadKind,
}

/// Owns the managed upload directory; sessions track stored names and
/// ask for deletion on teardown.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_video_bytes: u64,
}

impl UploadStore {
    /// Open the store, creating the upload directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, max_video_bytes: u64) -> Result<Self, ScribeError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ScribeError::Other(e.into()))?;
        Ok(Self {
            dir,
            max_video_bytes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a stored name. The name must already be sanitized.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Validate and store an upload, returning the stored name.
    ///
    /// Rejects disallowed extensions and oversized videos with
    /// `InvalidInput`; nothing is written in either case.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload, ScribeError> {
        let name = sanitize_filename(original_name)?;
        let kind = upload_kind(&name).ok_or_else(|| {
            ScribeError::InvalidInput(format!("file type of {name:?} is not allowed"))
        })?;

        if kind == UploadKind::Video && bytes.len() as u64 > self.max_video_bytes {
            return Err(ScribeError::InvalidInput(format!(
                "video exceeds {} byte limit",
                self.max_video_bytes
            )));
        }

        let path = self.path_of(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ScribeError::Other(e.into()))?;

        info!(name = %name, bytes = bytes.len(), "Stored upload");
        Ok(StoredUpload { name, path, kind })
    }

    /// Best-effort deletion; returns whether the file is gone.
    ///
    /// A failure is logged and swallowed so a sweep over many files keeps
    /// going.
    pub async fn delete(&self, name: &str) -> bool {
        let path = self.path_of(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete upload");
                false
            }
        }
    }
}
