//! Timeout wrapper for async operations.

use std::time::Duration;

/// Races `f` against `duration`, returning `Err(None)` if the deadline
/// elapses first so callers can distinguish a timeout from the
/// operation's own error type without this crate knowing that type.
pub async fn with_timeout<F, Fut, T, E>(duration: Duration, f: F) -> Result<T, Option<E>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, f()).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Some(e)),
        Err(_elapsed) => Err(None),
    }
}
