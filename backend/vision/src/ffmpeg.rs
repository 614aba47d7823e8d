//! FFmpeg-backed video decoder.
//!
//! Rips every frame of a video to numbered PNGs in a scratch directory.
//! Zero-padded names keep lexicographic order equal to frame order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use framescribe_core::{ScribeError, VideoDecoder};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct FfmpegDecoder {
    binary: String,
}

impl FfmpegDecoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl VideoDecoder for FfmpegDecoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn decode_frames(
        &self,
        video: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScribeError> {
        tokio::fs::create_dir_all(scratch_dir)
            .await
            .map_err(|e| ScribeError::Other(e.into()))?;

        let pattern = scratch_dir.join("frame_%06d.png");
        debug!(video = %video.display(), "Decoding video frames");

        let output = Command::new(&self.binary)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-y")
            .arg("-i")
            .arg(video)
            .args(["-vsync", "0"])
            .arg(&pattern)
            .output()
            .await
            .map_err(|e| {
                ScribeError::unavailable("decode", format!("failed to run {}: {e}", self.binary))
            })?;

        let frames = collect_frames(scratch_dir).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if frames.is_empty() {
                // Unreadable input decodes to zero frames, not an error.
                warn!(
                    video = %video.display(),
                    stderr = %stderr.trim(),
                    "Video unreadable; returning zero frames"
                );
            } else {
                warn!(
                    video = %video.display(),
                    frames = frames.len(),
                    stderr = %stderr.trim(),
                    "Decode error mid-stream; returning partial frames"
                );
            }
        }

        Ok(frames)
    }
}

async fn collect_frames(scratch_dir: &Path) -> Result<Vec<PathBuf>, ScribeError> {
    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(scratch_dir)
        .await
        .map_err(|e| ScribeError::Other(e.into()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScribeError::Other(e.into()))?
    {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("frame_") && name.ends_with(".png") {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}
