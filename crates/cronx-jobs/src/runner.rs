//! Fires a single job once: timeout, retry with backoff, and failure
//! notification.

use std::time::Duration;

use cronx_core::{Job, OnFailure, RunStatus};
use cronx_resilience::with_timeout;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::executor::{Executor, TriggerOutcome};

/// Classifies a failed `trigger` response into the concrete error kinds
/// the runner distinguishes: a resource-level refusal the executor
/// cannot possibly satisfy on retry (`Fatal`), versus a generic
/// transport/application failure worth retrying (`Executor`).
fn classify_executor_failure(error: Option<String>) -> RunnerError {
    let message = error.unwrap_or_else(|| "executor reported failure".to_string());
    if message.contains("permission denied") || message.contains("disk full") {
        RunnerError::Fatal(message)
    } else {
        RunnerError::Executor(message)
    }
}

/// Outcome of one fire.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    pub attempts: u32,
    pub error: Option<String>,
    pub response: Option<String>,
    pub duration_ms: i64,
}

pub struct Runner {
    executor: Box<dyn Executor>,
}

impl Runner {
    #[must_use]
    pub fn new(executor: Box<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Runs `job` to completion: up to `retry.attempts` calls to the
    /// executor, with per-attempt timeout and backoff between attempts.
    pub async fn run(&self, job: &Job) -> RunResult {
        let start = now_ms();
        let retry = job.retry_config();
        let timeout = Duration::from_secs(retry.timeout_secs);

        let mut attempts = 0u32;
        let mut last_error: Option<String> = None;
        let mut last_response: Option<String> = None;
        let mut status = RunStatus::Failed;

        while attempts < retry.attempts {
            attempts += 1;

            let outcome = with_timeout(timeout, || async {
                Ok::<TriggerOutcome, ()>(
                    self.executor
                        .trigger(
                            &job.action.message,
                            job.action.priority,
                            job.delivery_hints.as_ref(),
                            timeout,
                        )
                        .await,
                )
            })
            .await;

            match outcome {
                Ok(result) if result.success => {
                    status = RunStatus::Success;
                    last_response = result.message;
                    last_error = None;
                    break;
                }
                Ok(result) => {
                    let classified = classify_executor_failure(result.error);
                    debug!(job = %job.name, attempt = attempts, error = %classified, "attempt failed");
                    let retryable = classified.is_retryable();
                    last_error = Some(classified.to_string());
                    if !retryable {
                        status = RunStatus::Failed;
                        break;
                    }
                }
                Err(None) => {
                    let classified = RunnerError::Timeout(retry.timeout_secs);
                    status = RunStatus::Timeout;
                    last_error = Some(classified.to_string());
                    break;
                }
                Err(Some(())) => unreachable!("trigger future never returns Err"),
            }

            if attempts < retry.attempts {
                let delay = retry.backoff_delay_ms(attempts);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        let completed = now_ms();

        let result = RunResult {
            status,
            attempts,
            error: last_error,
            response: last_response,
            duration_ms: completed - start,
        };

        if result.status != RunStatus::Success {
            self.notify_failure(job, &result).await;
        }

        result
    }

    // spec.md §4.6 step 4 reads literally as "notify unless onFailure ==
    // silent", which would also notify when onFailure is unset; §7 phrases
    // the same behavior narrower, as "when onFailure = notify|escalate".
    // This resolves the ambiguity toward §7: an unset onFailure is treated
    // as silent (no notification), since a job that never opted into
    // notification shouldn't start receiving one by omission.
    async fn notify_failure(&self, job: &Job, result: &RunResult) {
        let Some(on_failure) = job.on_failure else {
            return;
        };
        if on_failure == OnFailure::Silent {
            return;
        }

        let prefix = if on_failure == OnFailure::Escalate {
            "[ESCALATE] "
        } else {
            ""
        };
        let message = format!(
            "{prefix}job '{}' failed: {}",
            job.name,
            result.error.as_deref().unwrap_or("unknown error")
        );
        let priority = if on_failure == OnFailure::Escalate {
            cronx_core::Priority::High
        } else {
            job.action.priority
        };

        if let Err(e) = self.executor.notify(&message, priority).await {
            warn!(job = %job.name, error = %e, "notification failed, swallowing");
        }
    }
}

fn now_ms() -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    ms
}
