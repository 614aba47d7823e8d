//! Session expiry as an explicit state machine.
//!
//! A session is `Active` or `Expired` as a pure function of its start
//! time and the clock; destruction is its removal from the registry.
//! Callers never learn about expiry from a failed lookup.

use chrono::{DateTime, Duration, Utc};

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Expired,
}

/// Decide whether a session that started at `started_at` is still live
/// at `now`.
pub fn check_expiry(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> SessionStatus {
    if now.signed_duration_since(started_at) > timeout {
        SessionStatus::Expired
    } else {
        SessionStatus::Active
    }
}
