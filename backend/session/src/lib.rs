//! Per-user session management for Framescribe.
//!
//! The registry multiplexes many anonymous users against one process:
//! each session owns its transcript, its bounded memory, its uploaded
//! files, and at most one video extraction result. Sessions expire 30
//! minutes after they start and take everything they own with them.

pub mod expiry;
pub mod registry;

pub use expiry::{check_expiry, SessionStatus};
pub use registry::{Acquired, SessionRegistry};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use framescribe_memory::{SummaryBufferMemory, Transcript};
use vision::VideoResult;

pub type SessionId = Uuid;

/// State owned by one anonymous user, reachable only through the
/// registry. Mutations happen under the session's own lock, one request
/// at a time.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub transcript: Transcript,
    pub memory: SummaryBufferMemory,
    /// Stored names of files this session uploaded; swept on teardown.
    pub uploads: Vec<String>,
    pub video: Option<Arc<VideoResult>>,
}

impl Session {
    pub fn new(max_token_limit: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            last_seen: now,
            transcript: Transcript::new(),
            memory: SummaryBufferMemory::new(max_token_limit),
            uploads: Vec::new(),
            video: None,
        }
    }
}
