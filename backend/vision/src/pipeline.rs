use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use framescribe_core::deadline::DEFAULT_DEADLINE;
use framescribe_core::{with_deadline, OcrEngine, ScribeError, TextSpan, VideoDecoder};
use tracing::{info, warn};
use uuid::Uuid;

/// Opaque identity of one video's extraction result.
pub type VideoId = Uuid;

/// Join recognized spans into plain text, in detection order.
///
/// Detection order is whatever the engine returned; no reading-order
/// guarantee is made.
pub fn join_spans(spans: &[TextSpan]) -> String {
    spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The full set of per-frame OCR outputs produced from one uploaded video.
#[derive(Debug, Clone)]
pub struct VideoResult {
    pub id: VideoId,
    pub frames: Vec<Vec<TextSpan>>,
    pub file: String,
}

impl VideoResult {
    pub fn new(frames: Vec<Vec<TextSpan>>, file: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frames,
            file: file.into(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Joined text of one frame's spans. `OutOfRange` outside
    /// `[0, frame_count)`.
    pub fn select_frame(&self, index: usize) -> Result<String, ScribeError> {
        let spans = self
            .frames
            .get(index)
            .ok_or(ScribeError::OutOfRange {
                index,
                frame_count: self.frames.len(),
            })?;
        Ok(join_spans(spans))
    }
}

/// OCR extraction over single images and whole videos.
pub struct FramePipeline {
    ocr: Arc<dyn OcrEngine>,
    decoder: Arc<dyn VideoDecoder>,
    deadline: Duration,
}

impl FramePipeline {
    pub fn new(ocr: Arc<dyn OcrEngine>, decoder: Arc<dyn VideoDecoder>) -> Self {
        Self {
            ocr,
            decoder,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// OCR one image and return its recognized text.
    pub async fn extract_image(&self, image: &Path) -> Result<String, ScribeError> {
        let spans = with_deadline("ocr", self.deadline, self.ocr.recognize(image)).await?;
        Ok(join_spans(&spans))
    }

    /// Decode every frame of a video and OCR each one, returning one span
    /// list per frame. Runs to completion before anything can be selected.
    ///
    /// An unreadable video yields zero frames; a decode error mid-stream
    /// truncates to the frames read so far. A per-frame OCR failure yields
    /// an empty span list for that frame only.
    pub async fn extract_video(
        &self,
        video: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<Vec<TextSpan>>, ScribeError> {
        let frame_dir = scratch_dir.join(format!("frames-{}", Uuid::new_v4().simple()));

        let frames = with_deadline(
            "decode",
            self.deadline,
            self.decoder.decode_frames(video, &frame_dir),
        )
        .await?;

        let mut results = Vec::with_capacity(frames.len());
        for (index, frame) in frames.iter().enumerate() {
            match with_deadline("ocr", self.deadline, self.ocr.recognize(frame)).await {
                Ok(spans) => results.push(spans),
                Err(e) => {
                    warn!(frame = index, error = %e, "OCR failed for frame; keeping empty entry");
                    results.push(Vec::new());
                }
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&frame_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %frame_dir.display(), error = %e, "Failed to clean frame scratch dir");
            }
        }

        info!(
            video = %video.display(),
            frames = results.len(),
            "Video OCR extraction complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use framescribe_core::BoundingBox;
    use std::path::PathBuf;

    fn span(text: &str) -> TextSpan {
        TextSpan::new(
            BoundingBox {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
            text,
            0.9,
        )
    }

    /// Returns spans keyed off the frame file name.
    struct FakeOcr;

    #[async_trait]
    impl OcrEngine for FakeOcr {
        fn name(&self) -> &str {
            "fake"
        }

        async fn recognize(&self, image: &Path) -> Result<Vec<TextSpan>, ScribeError> {
            let name = image.file_name().unwrap().to_string_lossy();
            match name.as_ref() {
                "frame_2.png" => Ok(vec![span("hello"), span("world")]),
                "frame_4.png" => Err(ScribeError::unavailable("ocr", "engine crashed")),
                _ => Ok(vec![span(name.as_ref())]),
            }
        }
    }

    /// Pretends the video decodes to a fixed number of frames.
    struct FakeDecoder {
        frame_count: usize,
    }

    #[async_trait]
    impl VideoDecoder for FakeDecoder {
        fn name(&self) -> &str {
            "fake"
        }

        async fn decode_frames(
            &self,
            _video: &Path,
            scratch_dir: &Path,
        ) -> Result<Vec<PathBuf>, ScribeError> {
            Ok((0..self.frame_count)
                .map(|i| scratch_dir.join(format!("frame_{i}.png")))
                .collect())
        }
    }

    fn pipeline(frame_count: usize) -> FramePipeline {
        FramePipeline::new(Arc::new(FakeOcr), Arc::new(FakeDecoder { frame_count }))
    }

    #[test]
    fn join_preserves_detection_order() {
        let spans = vec![span("b"), span("a"), span("c")];
        assert_eq!(join_spans(&spans), "b a c");
    }

    #[tokio::test]
    async fn five_frame_video_yields_five_entries() {
        let scratch = tempfile::tempdir().unwrap();
        let frames = pipeline(5)
            .extract_video(Path::new("clip.mp4"), scratch.path())
            .await
            .unwrap();
        assert_eq!(frames.len(), 5);

        let result = VideoResult::new(frames, "clip.mp4");
        assert_eq!(result.frame_count(), 5);
        assert_eq!(result.select_frame(2).unwrap(), "hello world");
        assert!(matches!(
            result.select_frame(5),
            Err(ScribeError::OutOfRange {
                index: 5,
                frame_count: 5
            })
        ));
    }

    #[tokio::test]
    async fn frame_ocr_failure_keeps_empty_entry() {
        let scratch = tempfile::tempdir().unwrap();
        let frames = pipeline(5)
            .extract_video(Path::new("clip.mp4"), scratch.path())
            .await
            .unwrap();
        assert!(frames[4].is_empty());
        assert!(!frames[2].is_empty());
    }

    #[tokio::test]
    async fn unreadable_video_yields_zero_frames() {
        let scratch = tempfile::tempdir().unwrap();
        let frames = pipeline(0)
            .extract_video(Path::new("broken.mp4"), scratch.path())
            .await
            .unwrap();
        assert!(frames.is_empty());

        let result = VideoResult::new(frames, "broken.mp4");
        assert!(matches!(
            result.select_frame(0),
            Err(ScribeError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn select_frame_is_deterministic() {
        let result = VideoResult::new(vec![vec![span("x"), span("y")]], "clip.mp4");
        assert_eq!(result.select_frame(0).unwrap(), result.select_frame(0).unwrap());
    }

    #[tokio::test]
    async fn extract_image_joins_spans() {
        let text = pipeline(0)
            .extract_image(Path::new("frame_2.png"))
            .await
            .unwrap();
        assert_eq!(text, "hello world");
    }
}
