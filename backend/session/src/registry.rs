//! The process-wide session registry.
//!
//! An injectable instance owned by the application context, never a
//! module-level global; tests get isolated registries. The outer map
//! lock is held only long enough to resolve a session handle; per-session
//! work happens under that session's own lock, so two users never block
//! each other on a model call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use chat::ConversationEngine;
use framescribe_core::{ScribeError, TextSpan, Turn};
use media::UploadStore;
use vision::{VideoId, VideoResult};

use crate::expiry::{check_expiry, SessionStatus};
use crate::{Session, SessionId};

/// Outcome of the expiry-checked lookup that precedes every
/// session-bound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// The caller's session is live; proceed.
    Live { id: SessionId },
    /// The caller's session was missing or expired; a fresh one was
    /// created and the caller should be told to restart the flow.
    Reset { id: SessionId },
}

impl Acquired {
    pub fn id(&self) -> SessionId {
        match *self {
            Acquired::Live { id } | Acquired::Reset { id } => id,
        }
    }

    pub fn was_reset(&self) -> bool {
        matches!(self, Acquired::Reset { .. })
    }
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<SessionId, Arc<Mutex<Session>>>,
    /// Video result identity → owning session.
    videos: HashMap<VideoId, SessionId>,
}

/// Process-wide mapping from session identity to per-user state.
pub struct SessionRegistry {
    state: Arc<RwLock<RegistryState>>,
    uploads: UploadStore,
    timeout: Duration,
    max_token_limit: usize,
}

impl SessionRegistry {
    pub fn new(uploads: UploadStore, timeout: Duration, max_token_limit: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            uploads,
            timeout,
            max_token_limit,
        }
    }

    /// Allocate a fresh identity with empty transcript and fresh memory.
    pub async fn create_session(&self) -> SessionId {
        let session = Session::new(self.max_token_limit);
        let id = session.id;
        self.state
            .write()
            .await
            .sessions
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "Session created");
        id
    }

    /// Expiry-checked entry point, called before servicing any
    /// session-bound request.
    pub async fn acquire(&self, id: Option<SessionId>) -> Acquired {
        self.acquire_at(id, Utc::now()).await
    }

    /// As [`acquire`](Self::acquire), with an injected clock.
    pub async fn acquire_at(&self, id: Option<SessionId>, now: DateTime<Utc>) -> Acquired {
        let Some(id) = id else {
            return Acquired::Reset {
                id: self.create_session().await,
            };
        };

        let entry = self.state.read().await.sessions.get(&id).cloned();
        let Some(entry) = entry else {
            debug!(session = %id, "Unknown session identity; issuing a fresh one");
            return Acquired::Reset {
                id: self.create_session().await,
            };
        };

        let started_at = entry.lock().await.started_at;
        match check_expiry(started_at, now, self.timeout) {
            SessionStatus::Active => {
                entry.lock().await.last_seen = now;
                Acquired::Live { id }
            }
            SessionStatus::Expired => {
                info!(session = %id, "Session expired; destroying and replacing");
                self.destroy(id).await;
                Acquired::Reset {
                    id: self.create_session().await,
                }
            }
        }
    }

    /// Destroy a session and release everything it owns. Idempotent:
    /// destroying an absent identity is a no-op.
    pub async fn destroy(&self, id: SessionId) {
        let removed = {
            let mut state = self.state.write().await;
            match state.sessions.remove(&id) {
                Some(entry) => {
                    state.videos.retain(|_, owner| *owner != id);
                    Some(entry)
                }
                None => None,
            }
        };

        let Some(entry) = removed else {
            debug!(session = %id, "Destroy of absent session is a no-op");
            return;
        };

        let session = entry.lock().await;
        let mut failed = 0usize;
        for name in &session.uploads {
            if !self.uploads.delete(name).await {
                failed += 1;
            }
        }
        if failed > 0 {
            warn!(session = %id, failed, "Some uploads could not be deleted");
        }
        info!(
            session = %id,
            uploads = session.uploads.len(),
            turns = session.transcript.len(),
            idle_secs = Utc::now().signed_duration_since(session.last_seen).num_seconds(),
            "Session destroyed"
        );
    }

    /// Run one conversational exchange for a session, holding its lock
    /// for the whole request: either the (query, answer) pair is fully
    /// appended to transcript and memory, or nothing is.
    pub async fn converse(
        &self,
        id: SessionId,
        query: &str,
        engine: &ConversationEngine,
    ) -> Result<String, ScribeError> {
        let entry = self.get(id).await?;
        let mut session = entry.lock().await;

        let answer = engine.respond(query, &session.memory).await;

        session.transcript.push(Turn::user(query));
        session.transcript.push(Turn::ai(answer.clone()));
        session.memory.append(query, &answer, engine.model()).await;
        Ok(answer)
    }

    /// Record a stored upload as owned by this session, for teardown.
    pub async fn track_upload(&self, id: SessionId, stored_name: impl Into<String>) -> Result<(), ScribeError> {
        let entry = self.get(id).await?;
        entry.lock().await.uploads.push(stored_name.into());
        Ok(())
    }

    /// Bind a completed video extraction to its owning session,
    /// dropping any previous result.
    pub async fn attach_video(
        &self,
        id: SessionId,
        frames: Vec<Vec<TextSpan>>,
        file: impl Into<String>,
    ) -> Result<VideoId, ScribeError> {
        let result = Arc::new(VideoResult::new(frames, file));
        let video_id = result.id;

        let mut state = self.state.write().await;
        let entry = state
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| ScribeError::NotFound(format!("session {id}")))?;
        let mut session = entry.lock().await;
        if let Some(old) = session.video.take() {
            state.videos.remove(&old.id);
        }
        session.video = Some(Arc::clone(&result));
        state.videos.insert(video_id, id);

        info!(session = %id, video = %video_id, frames = result.frame_count(), "Video result attached");
        Ok(video_id)
    }

    /// Look up a video result by its identity.
    pub async fn video(&self, video_id: VideoId) -> Result<Arc<VideoResult>, ScribeError> {
        let entry = {
            let state = self.state.read().await;
            let owner = state
                .videos
                .get(&video_id)
                .ok_or_else(|| ScribeError::NotFound(format!("video {video_id}")))?;
            state
                .sessions
                .get(owner)
                .cloned()
                .ok_or_else(|| ScribeError::NotFound(format!("video {video_id}")))?
        };
        let session = entry.lock().await;
        session
            .video
            .clone()
            .ok_or_else(|| ScribeError::NotFound(format!("video {video_id}")))
    }

    /// The full transcript of a session, oldest first.
    pub async fn transcript(&self, id: SessionId) -> Result<Vec<Turn>, ScribeError> {
        let entry = self.get(id).await?;
        let session = entry.lock().await;
        Ok(session.transcript.turns().to_vec())
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Handle to a live session, or `NotFound` if the identity was never
    /// created, was destroyed, or expired.
    pub async fn get(&self, id: SessionId) -> Result<Arc<Mutex<Session>>, ScribeError> {
        self.state
            .read()
            .await
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| ScribeError::NotFound(format!("session {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat::{MockProvider, FALLBACK_TEXT};
    use framescribe_core::{BoundingBox, Sender};
    use uuid::Uuid;

    async fn registry() -> (tempfile::TempDir, SessionRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path(), 1024 * 1024).await.unwrap();
        (dir, SessionRegistry::new(store, Duration::minutes(30), 4096))
    }

    fn engine_with(provider: MockProvider) -> ConversationEngine {
        ConversationEngine::new(Arc::new(provider))
    }

    fn span(text: &str) -> TextSpan {
        TextSpan::new(
            BoundingBox {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            text,
            1.0,
        )
    }

    #[tokio::test]
    async fn create_then_destroy_is_idempotent() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        assert_eq!(registry.session_count().await, 1);

        registry.destroy(id).await;
        registry.destroy(id).await; // second call is a no-op
        assert_eq!(registry.session_count().await, 0);
        assert!(registry.transcript(id).await.is_err());
    }

    #[tokio::test]
    async fn acquire_without_identity_resets() {
        let (_dir, registry) = registry().await;
        let acquired = registry.acquire(None).await;
        assert!(acquired.was_reset());
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn acquire_live_session_stays_live() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let acquired = registry.acquire(Some(id)).await;
        assert_eq!(acquired, Acquired::Live { id });
    }

    #[tokio::test]
    async fn expired_session_is_destroyed_and_replaced() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let engine = engine_with(MockProvider::new("mock").with_response("ok"));
        registry.converse(id, "hello", &engine).await.unwrap();

        let later = Utc::now() + Duration::minutes(31);
        let acquired = registry.acquire_at(Some(id), later).await;
        assert!(acquired.was_reset());
        let new_id = acquired.id();
        assert_ne!(new_id, id);

        // Old identity is gone; the replacement starts with empty history.
        assert!(registry.transcript(id).await.is_err());
        assert!(registry.transcript(new_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn converse_appends_pair_in_order() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let engine = engine_with(MockProvider::new("mock").with_response("better text"));

        let answer = registry.converse(id, "improve this", &engine).await.unwrap();
        assert_eq!(answer, "better text");

        let turns = registry.transcript(id).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].sender, Sender::User);
        assert_eq!(turns[0].message, "improve this");
        assert_eq!(turns[1].sender, Sender::Ai);
        assert_eq!(turns[1].message, "better text");
    }

    #[tokio::test]
    async fn failed_model_appends_fallback_not_error() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let engine = engine_with(MockProvider::failing("mock"));

        let answer = registry.converse(id, "improve this", &engine).await.unwrap();
        assert_eq!(answer, FALLBACK_TEXT);

        let turns = registry.transcript(id).await.unwrap();
        assert_eq!(turns[1].message, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn converse_on_unknown_session_is_not_found() {
        let (_dir, registry) = registry().await;
        let engine = engine_with(MockProvider::new("mock"));
        let err = registry
            .converse(Uuid::new_v4(), "hello", &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::NotFound(_)));
    }

    #[tokio::test]
    async fn destroy_sweeps_owned_uploads_best_effort() {
        let (dir, registry) = registry().await;
        let id = registry.create_session().await;

        // One real file and one undeletable entry (a directory).
        tokio::fs::write(dir.path().join("photo.png"), b"x").await.unwrap();
        tokio::fs::create_dir(dir.path().join("blocker.png")).await.unwrap();
        registry.track_upload(id, "photo.png").await.unwrap();
        registry.track_upload(id, "blocker.png").await.unwrap();

        registry.destroy(id).await;

        // The failure on one entry did not stop the sweep.
        assert!(!dir.path().join("photo.png").exists());
        assert!(dir.path().join("blocker.png").exists());
    }

    #[tokio::test]
    async fn video_results_die_with_their_session() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let video_id = registry
            .attach_video(id, vec![vec![span("hi")]], "clip.mp4")
            .await
            .unwrap();

        let result = registry.video(video_id).await.unwrap();
        assert_eq!(result.select_frame(0).unwrap(), "hi");

        registry.destroy(id).await;
        assert!(registry.video(video_id).await.is_err());
    }

    #[tokio::test]
    async fn attaching_a_new_video_replaces_the_old() {
        let (_dir, registry) = registry().await;
        let id = registry.create_session().await;
        let first = registry
            .attach_video(id, vec![vec![span("one")]], "a.mp4")
            .await
            .unwrap();
        let second = registry
            .attach_video(id, vec![vec![span("two")]], "b.mp4")
            .await
            .unwrap();

        assert!(registry.video(first).await.is_err());
        assert_eq!(
            registry.video(second).await.unwrap().select_frame(0).unwrap(),
            "two"
        );
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_interfere() {
        let (_dir, registry) = registry().await;
        let registry = Arc::new(registry);
        let a = registry.create_session().await;
        let b = registry.create_session().await;

        let engine_a = engine_with(MockProvider::new("mock").with_response("for a"));
        let engine_b = engine_with(MockProvider::new("mock").with_response("for b"));

        let (ra, rb) = tokio::join!(
            registry.converse(a, "question a", &engine_a),
            registry.converse(b, "question b", &engine_b),
        );
        assert_eq!(ra.unwrap(), "for a");
        assert_eq!(rb.unwrap(), "for b");
        assert_eq!(registry.transcript(a).await.unwrap().len(), 2);
        assert_eq!(registry.transcript(b).await.unwrap().len(), 2);
    }
}
