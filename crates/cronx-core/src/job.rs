//! Job data model: the immutable input, its mutable persisted state, and
//! the append-only run history record.

use serde::{Deserialize, Serialize};

use crate::strategy::StrategyConfig;
use crate::validation::{valid_session_key, valid_session_url};
use crate::CoreError;

/// Delivery priority handed opaquely to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// What to do when a fire ends in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    Notify,
    Silent,
    Escalate,
}

/// Retry backoff shape. See [`crate::job::RetryConfig::backoff_delay_ms`]
/// for the formula attached to each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Linear,
    Exponential,
}

/// Per-job retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff: BackoffKind,
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: BackoffKind::Exponential,
            timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Delay before the next attempt, given the 1-indexed attempt count
    /// just completed.
    #[must_use]
    pub fn backoff_delay_ms(&self, attempts: u32) -> u64 {
        match self.backoff {
            BackoffKind::Fixed => 1_000,
            BackoffKind::Linear => u64::from(attempts) * 1_000,
            BackoffKind::Exponential => 2u64.saturating_pow(attempts) * 1_000,
        }
    }
}

/// The action dispatched to the executor on a fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub message: String,
    pub priority: Priority,
}

/// Opaque delivery hints forwarded to the executor without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHints {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub thinking_level: Option<String>,
}

/// Immutable input to the core: a single scheduled job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub strategy: StrategyConfig,
    pub action: Action,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub on_failure: Option<OnFailure>,
    #[serde(default)]
    pub delivery_hints: Option<DeliveryHints>,
    /// Transport URL used by an HTTP-shaped executor, if any. Re-validated
    /// here even though the upstream loader is expected to have checked it.
    #[serde(default)]
    pub session_url: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Job {
    /// Retry policy in effect: the job's own or the default.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.unwrap_or_default()
    }

    /// Re-asserts the external validation rules against this job's fields.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("job name must not be blank".to_string());
        }
        if let Err(e) = self.strategy.validate() {
            errors.push(e.to_string());
        }
        if let Some(url) = &self.session_url {
            if let Err(e) = valid_session_url(url) {
                errors.push(e.to_string());
            }
        }
        if let Some(key) = &self.session_key {
            if let Err(e) = valid_session_key(key) {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::validation(errors.join("; ")))
        }
    }
}

/// Mutable, persisted scheduling state for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    /// Millisecond epoch timestamp of the next intended fire. `None` only
    /// for a job that has never been scheduled, or is disabled.
    pub next_run: Option<i64>,
    pub last_run: Option<i64>,
    pub enabled: bool,
    pub fail_count: u32,
}

impl JobState {
    /// The initial state for a job that has never run.
    #[must_use]
    pub fn initial(enabled: bool) -> Self {
        Self {
            next_run: None,
            last_run: None,
            enabled,
            fail_count: 0,
        }
    }
}

/// Outcome of a single fire attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
    Timeout,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
        }
    }
}

/// An append-only log entry describing one fire of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Option<i64>,
    pub job_name: String,
    pub scheduled_at: i64,
    pub triggered_at: i64,
    pub completed_at: i64,
    pub duration_ms: i64,
    pub status: RunStatus,
    pub response: Option<String>,
    pub error: Option<String>,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::IntervalConfig;

    fn sample_job() -> Job {
        Job {
            name: "nudge".to_string(),
            strategy: StrategyConfig::Interval(IntervalConfig {
                min_secs: 300,
                max_secs: 600,
                jitter: 0.0,
            }),
            action: Action {
                message: "check in".to_string(),
                priority: Priority::Normal,
            },
            enabled: true,
            retry: None,
            on_failure: None,
            delivery_hints: None,
            session_url: None,
            session_key: None,
        }
    }

    #[test]
    fn test_backoff_delay_ms() {
        let retry = RetryConfig {
            attempts: 3,
            backoff: BackoffKind::Fixed,
            timeout_secs: 30,
        };
        assert_eq!(retry.backoff_delay_ms(1), 1_000);
        assert_eq!(retry.backoff_delay_ms(2), 1_000);

        let linear = RetryConfig {
            backoff: BackoffKind::Linear,
            ..retry
        };
        assert_eq!(linear.backoff_delay_ms(3), 3_000);

        let exp = RetryConfig {
            backoff: BackoffKind::Exponential,
            ..retry
        };
        assert_eq!(exp.backoff_delay_ms(1), 2_000);
        assert_eq!(exp.backoff_delay_ms(2), 4_000);
    }

    #[test]
    fn test_job_validate_ok() {
        assert!(sample_job().validate().is_ok());
    }

    #[test]
    fn test_job_validate_rejects_blank_name() {
        let mut job = sample_job();
        job.name = "  ".to_string();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_job_validate_rejects_bad_session_url() {
        let mut job = sample_job();
        job.session_url = Some("http://example.com".to_string());
        assert!(job.validate().is_err());
    }
}
