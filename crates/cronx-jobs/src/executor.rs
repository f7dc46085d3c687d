//! The executor contract and its two concrete shapes.
//!
//! The runner is coupled only to the `{trigger, notify}` contract, never
//! to either concrete implementation — which one backs a job is a
//! wiring decision made by whoever assembles the scheduler.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use cronx_core::{DeliveryHints, Priority};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Outcome of a single `trigger` call.
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// The external collaborator that turns a job's action into an
/// observable effect on an AI-agent runtime.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Invokes the agent with `message`/`priority`, honoring `timeout`.
    /// `context` carries the job's delivery hints (recipient, thinking
    /// level) opaquely — the executor may ignore fields it doesn't
    /// understand.
    async fn trigger(
        &self,
        message: &str,
        priority: Priority,
        context: Option<&DeliveryHints>,
        timeout: Duration,
    ) -> TriggerOutcome;

    /// Best-effort informational notification; failures are the
    /// caller's responsibility to log and swallow.
    async fn notify(&self, message: &str, priority: Priority) -> Result<(), String>;
}

#[derive(Serialize)]
struct TriggerFile<'a> {
    message: &'a str,
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a DeliveryHints>,
}

/// Writes a trigger file atomically (write to a `.tmp` sibling, then
/// rename) and invokes a child process to consume it.
pub struct FileExecutor {
    trigger_dir: PathBuf,
    command: String,
    args: Vec<String>,
}

impl FileExecutor {
    #[must_use]
    pub fn new(trigger_dir: PathBuf, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            trigger_dir,
            command: command.into(),
            args,
        }
    }

    async fn write_trigger_file(
        &self,
        message: &str,
        priority: Priority,
        context: Option<&DeliveryHints>,
    ) -> Result<PathBuf, String> {
        let file = TriggerFile { message, priority, context };
        let body = serde_json::to_vec(&file).map_err(|e| e.to_string())?;

        let final_path = self.trigger_dir.join(format!("trigger-{}.json", uuid::Uuid::new_v4()));
        let tmp_path = final_path.with_extension("tmp");

        let mut handle = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| e.to_string())?;
        handle.write_all(&body).await.map_err(|e| e.to_string())?;
        handle.flush().await.map_err(|e| e.to_string())?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| e.to_string())?;

        Ok(final_path)
    }
}

#[async_trait]
impl Executor for FileExecutor {
    async fn trigger(
        &self,
        message: &str,
        priority: Priority,
        context: Option<&DeliveryHints>,
        timeout: Duration,
    ) -> TriggerOutcome {
        let path = match self.write_trigger_file(message, priority, context).await {
            Ok(p) => p,
            Err(e) => {
                return TriggerOutcome {
                    success: false,
                    message: None,
                    error: Some(e),
                }
            }
        };

        let mut command = tokio::process::Command::new(&self.command);
        command.args(&self.args).arg(&path);

        let spawn_result = tokio::time::timeout(timeout, command.output()).await;

        match spawn_result {
            Ok(Ok(output)) if output.status.success() => TriggerOutcome {
                success: true,
                message: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                error: None,
            },
            Ok(Ok(output)) => TriggerOutcome {
                success: false,
                message: None,
                error: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            },
            Ok(Err(e)) => TriggerOutcome {
                success: false,
                message: None,
                error: Some(e.to_string()),
            },
            Err(_elapsed) => TriggerOutcome {
                success: false,
                message: None,
                error: Some("child process timed out".to_string()),
            },
        }
    }

    async fn notify(&self, message: &str, priority: Priority) -> Result<(), String> {
        debug!(message, ?priority, "file executor notify");
        self.write_trigger_file(message, priority, None).await.map(|_| ())
    }
}

/// POSTs the action to a network endpoint.
pub struct HttpExecutor {
    client: reqwest::Client,
    trigger_url: String,
    notify_url: Option<String>,
}

impl HttpExecutor {
    #[must_use]
    pub fn new(trigger_url: impl Into<String>, notify_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            trigger_url: trigger_url.into(),
            notify_url,
        }
    }
}

#[derive(Serialize)]
struct TriggerRequest<'a> {
    message: &'a str,
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a DeliveryHints>,
}

#[derive(serde::Deserialize)]
struct TriggerResponse {
    success: bool,
    message: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn trigger(
        &self,
        message: &str,
        priority: Priority,
        context: Option<&DeliveryHints>,
        timeout: Duration,
    ) -> TriggerOutcome {
        let body = TriggerRequest { message, priority, context };
        let call = self
            .client
            .post(&self.trigger_url)
            .json(&body)
            .timeout(timeout)
            .send();

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => match response.json::<TriggerResponse>().await {
                Ok(parsed) => TriggerOutcome {
                    success: parsed.success,
                    message: parsed.message,
                    error: parsed.error,
                },
                Err(e) => TriggerOutcome {
                    success: false,
                    message: None,
                    error: Some(format!("unparsable response: {e}")),
                },
            },
            Ok(Err(e)) => TriggerOutcome {
                success: false,
                message: None,
                error: Some(e.to_string()),
            },
            Err(_elapsed) => TriggerOutcome {
                success: false,
                message: None,
                error: Some("request timed out".to_string()),
            },
        }
    }

    async fn notify(&self, message: &str, priority: Priority) -> Result<(), String> {
        let Some(url) = &self.notify_url else {
            warn!("no notify_url configured, dropping notification");
            return Ok(());
        };
        let body = TriggerRequest { message, priority, context: None };
        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_executor_trigger_success_runs_command_against_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let executor = FileExecutor::new(dir.path().to_path_buf(), "cat".to_string(), vec![]);

        let outcome = executor
            .trigger("check in", Priority::Normal, None, Duration::from_secs(5))
            .await;

        assert!(outcome.success);
        let body = outcome.message.unwrap();
        assert!(body.contains("check in"));

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1, "exactly one trigger file should remain, no stray .tmp");
    }

    #[tokio::test]
    async fn test_file_executor_trigger_failure_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let executor = FileExecutor::new(dir.path().to_path_buf(), "false".to_string(), vec![]);

        let outcome = executor
            .trigger("check in", Priority::Normal, None, Duration::from_secs(5))
            .await;

        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_file_executor_trigger_honors_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let executor = FileExecutor::new(dir.path().to_path_buf(), "sleep".to_string(), vec!["5".to_string()]);

        let outcome = executor
            .trigger("check in", Priority::Normal, None, Duration::from_millis(50))
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_file_executor_notify_does_not_invoke_command() {
        let dir = tempfile::tempdir().unwrap();
        // A command that always fails: notify() must not depend on it.
        let executor = FileExecutor::new(dir.path().to_path_buf(), "false".to_string(), vec![]);

        let result = executor.notify("heads up", Priority::Low).await;
        assert!(result.is_ok());

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_some());
    }
}
