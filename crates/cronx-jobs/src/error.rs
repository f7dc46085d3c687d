//! Runner and scheduler error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// A non-success response from the executor — retried up to the
    /// job's attempt cap.
    #[error("executor error: {0}")]
    Executor(String),

    /// Per-attempt deadline exceeded. Terminal for the current fire.
    #[error("executor timed out after {0}s")]
    Timeout(u64),

    /// A resource-level refusal (permission denied, disk full, or
    /// analogous) that cannot possibly succeed on retry.
    #[error("fatal executor error: {0}")]
    Fatal(String),

    #[error(transparent)]
    Store(#[from] cronx_store::StoreError),

    #[error(transparent)]
    Core(#[from] cronx_core::CoreError),
}

impl RunnerError {
    /// True when a retry could plausibly help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunnerError::Executor(_))
    }
}
