//! Deadline boundary for external capability calls.
//!
//! The language, OCR, and decode capabilities are single blocking round
//! trips with no timeout of their own. Every call site wraps them here so
//! an unresponsive backend surfaces as `Unavailable` instead of hanging
//! the request.

use std::future::Future;
use std::time::Duration;

use crate::error::ScribeError;

/// Default deadline applied to external capability calls.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

/// Await `fut` for at most `deadline`, mapping an elapsed deadline to
/// `ScribeError::Unavailable` for the named capability.
pub async fn with_deadline<T, F>(
    capability: &str,
    deadline: Duration,
    fut: F,
) -> Result<T, ScribeError>
where
    F: Future<Output = Result<T, ScribeError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ScribeError::unavailable(
            capability,
            format!("no response within {}s", deadline.as_secs()),
        )),
    }
}
