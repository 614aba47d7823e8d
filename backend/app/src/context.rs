use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chat::{ConversationEngine, GeminiProvider};
use framescribe_config::FramescribeConfig;
use framescribe_core::{LanguageModel, OcrEngine, ScribeError, VideoDecoder};
use framescribe_session::{Acquired, SessionId, SessionRegistry};
use media::{UploadKind, UploadStore};
use tracing::info;
use vision::{FfmpegDecoder, FramePipeline, TesseractOcr, VideoId};

/// Everything a request handler needs, wired once at startup.
pub struct AppContext {
    registry: SessionRegistry,
    engine: ConversationEngine,
    pipeline: FramePipeline,
    uploads: UploadStore,
}

impl AppContext {
    /// Wire the real capabilities from configuration.
    pub async fn from_config(config: &FramescribeConfig) -> Result<Self, ScribeError> {
        let deadline = Duration::from_secs(config.capability.deadline_secs);

        let llm: Arc<dyn LanguageModel> = Arc::new(GeminiProvider::new(
            config.model.api_key.clone(),
            config.model.name.clone(),
            config.model.temperature,
        ));

        let mut ocr = TesseractOcr::new(config.ocr.binary.clone(), config.ocr.languages.clone());
        if let Some(dir) = &config.ocr.model_dir {
            ocr = ocr.with_model_dir(dir);
        }
        let decoder = FfmpegDecoder::new(config.video.binary.clone());

        Self::assemble(
            llm,
            Arc::new(ocr),
            Arc::new(decoder),
            PathBuf::from(&config.uploads.dir),
            config.uploads.max_video_bytes,
            config.session.timeout_minutes,
            config.memory.max_token_limit,
            deadline,
        )
        .await
    }

    /// Wire from explicit capability implementations. Used by tests and
    /// by hosts that bring their own providers.
    pub async fn assemble(
        llm: Arc<dyn LanguageModel>,
        ocr: Arc<dyn OcrEngine>,
        decoder: Arc<dyn VideoDecoder>,
        upload_dir: PathBuf,
        max_video_bytes: u64,
        timeout_minutes: u64,
        max_token_limit: usize,
        deadline: Duration,
    ) -> Result<Self, ScribeError> {
        let uploads = UploadStore::open(upload_dir, max_video_bytes).await?;
        let engine = ConversationEngine::new(llm).with_deadline(deadline);
        let pipeline = FramePipeline::new(ocr, decoder).with_deadline(deadline);
        let registry = SessionRegistry::new(
            uploads.clone(),
            chrono::Duration::minutes(timeout_minutes as i64),
            max_token_limit,
        );

        info!("Application context assembled");
        Ok(Self {
            registry,
            engine,
            pipeline,
            uploads,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Expiry-checked session resolution for an incoming request.
    pub async fn acquire_session(&self, id: Option<SessionId>) -> Acquired {
        self.registry.acquire(id).await
    }

    /// Store an uploaded image, OCR it, and return the extracted text.
    pub async fn extract_image_upload(
        &self,
        session: SessionId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, ScribeError> {
        let stored = self.uploads.save(original_name, bytes).await?;
        if stored.kind != UploadKind::Image {
            self.uploads.delete(&stored.name).await;
            return Err(ScribeError::InvalidInput(format!(
                "{} is not an image",
                stored.name
            )));
        }
        self.registry.track_upload(session, &stored.name).await?;
        self.pipeline.extract_image(&stored.path).await
    }

    /// Store an uploaded video, OCR every frame, and bind the result to
    /// the session. Completes the whole extraction before returning.
    pub async fn extract_video_upload(
        &self,
        session: SessionId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<VideoId, ScribeError> {
        let stored = self.uploads.save(original_name, bytes).await?;
        if stored.kind != UploadKind::Video {
            self.uploads.delete(&stored.name).await;
            return Err(ScribeError::InvalidInput(format!(
                "{} is not a video",
                stored.name
            )));
        }
        self.registry.track_upload(session, &stored.name).await?;

        let frames = self
            .pipeline
            .extract_video(&stored.path, self.uploads.dir())
            .await?;
        self.registry.attach_video(session, frames, stored.name).await
    }

    /// Number of frames in a stored video result.
    pub async fn frame_count(&self, video: VideoId) -> Result<usize, ScribeError> {
        Ok(self.registry.video(video).await?.frame_count())
    }

    /// Joined text of one frame of a stored video result.
    pub async fn frame_text(&self, video: VideoId, index: usize) -> Result<String, ScribeError> {
        self.registry.video(video).await?.select_frame(index)
    }

    /// One conversational exchange: answer the query in session context
    /// and append the pair to transcript and memory.
    pub async fn improve_text(
        &self,
        session: SessionId,
        text: &str,
    ) -> Result<String, ScribeError> {
        if text.trim().is_empty() {
            return Err(ScribeError::InvalidInput("no text provided".into()));
        }
        self.registry.converse(session, text, &self.engine).await
    }

    /// Explicit logout: destroy the session and everything it owns.
    pub async fn logout(&self, session: SessionId) {
        self.registry.destroy(session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat::{MockProvider, FALLBACK_TEXT};
    use framescribe_core::{BoundingBox, TextSpan};
    use std::path::Path;

    struct FakeOcr;

    #[async_trait]
    impl OcrEngine for FakeOcr {
        fn name(&self) -> &str {
            "fake"
        }

        async fn recognize(&self, image: &Path) -> Result<Vec<TextSpan>, ScribeError> {
            let name = image.file_name().unwrap().to_string_lossy().into_owned();
            Ok(vec![TextSpan::new(
                BoundingBox {
                    x: 0,
                    y: 0,
                    width: 1,
                    height: 1,
                },
                format!("text-of-{name}"),
                0.9,
            )])
        }
    }

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
        ) -> Result<Vec<std::path::PathBuf>, ScribeError> {
            Ok((0..self.frame_count)
                .map(|i| scratch_dir.join(format!("frame_{i}.png")))
                .collect())
        }
    }

    async fn context(dir: &Path, llm: MockProvider, frame_count: usize) -> AppContext {
        AppContext::assemble(
            Arc::new(llm),
            Arc::new(FakeOcr),
            Arc::new(FakeDecoder { frame_count }),
            dir.to_path_buf(),
            1024 * 1024,
            30,
            4096,
            Duration::from_secs(5),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn image_upload_flows_to_extracted_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::new("mock"), 0).await;
        let session = app.acquire_session(None).await.id();

        let text = app
            .extract_image_upload(session, "receipt.png", b"fake-png")
            .await
            .unwrap();
        assert_eq!(text, "text-of-receipt.png");
    }

    #[tokio::test]
    async fn video_upload_flows_to_selectable_frames() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::new("mock"), 5).await;
        let session = app.acquire_session(None).await.id();

        let video = app
            .extract_video_upload(session, "clip.mp4", b"fake-mp4")
            .await
            .unwrap();
        assert_eq!(app.frame_count(video).await.unwrap(), 5);
        assert_eq!(
            app.frame_text(video, 2).await.unwrap(),
            "text-of-frame_2.png"
        );
        assert!(matches!(
            app.frame_text(video, 5).await.unwrap_err(),
            ScribeError::OutOfRange { .. }
        ));
    }

    #[tokio::test]
    async fn improve_text_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(
            dir.path(),
            MockProvider::new("mock").with_response("polished"),
            0,
        )
        .await;
        let session = app.acquire_session(None).await.id();

        let answer = app.improve_text(session, "rough ocr text").await.unwrap();
        assert_eq!(answer, "polished");

        let turns = app.registry().transcript(session).await.unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[tokio::test]
    async fn improve_rejects_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::new("mock"), 0).await;
        let session = app.acquire_session(None).await.id();

        let err = app.improve_text(session, "   ").await.unwrap_err();
        assert!(matches!(err, ScribeError::InvalidInput(_)));
        assert!(app.registry().transcript(session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_still_answers_with_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::failing("mock"), 0).await;
        let session = app.acquire_session(None).await.id();

        let answer = app.improve_text(session, "rough text").await.unwrap();
        assert_eq!(answer, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn mismatched_upload_kind_is_rejected_and_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::new("mock"), 0).await;
        let session = app.acquire_session(None).await.id();

        let err = app
            .extract_image_upload(session, "clip.mp4", b"fake-mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::InvalidInput(_)));
        assert!(!dir.path().join("clip.mp4").exists());
    }

    #[tokio::test]
    async fn logout_releases_files_and_video() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), MockProvider::new("mock"), 3).await;
        let session = app.acquire_session(None).await.id();

        let video = app
            .extract_video_upload(session, "clip.mp4", b"fake-mp4")
            .await
            .unwrap();
        assert!(dir.path().join("clip.mp4").exists());

        app.logout(session).await;
        assert!(!dir.path().join("clip.mp4").exists());
        assert!(app.frame_count(video).await.is_err());
        assert!(app.registry().transcript(session).await.is_err());
    }
}
