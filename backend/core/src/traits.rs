use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ScribeError;
use crate::types::TextSpan;

/// Trait for language model providers.
///
/// Model name and temperature are provider construction-time configuration;
/// the runtime only ever asks for text from a prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send a prompt and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, ScribeError>;
}

/// Trait for OCR engines.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name (e.g., "tesseract").
    fn name(&self) -> &str;

    /// Recognize text in a raster image, returning spans in detection order.
    async fn recognize(&self, image: &Path) -> Result<Vec<TextSpan>, ScribeError>;
}

/// Trait for video decoders.
///
/// A decoder materializes a video's frames as image files in `scratch_dir`
/// and returns them in frame order. A decode error mid-stream returns the
/// frames read so far; an unreadable video returns an empty list.
#[async_trait]
pub trait VideoDecoder: Send + Sync {
    /// Decoder name (e.g., "ffmpeg").
    fn name(&self) -> &str;

    async fn decode_frames(
        &self,
        video: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScribeError>;
}
