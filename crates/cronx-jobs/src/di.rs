//! Wiring: assembles a `Store` + `Runner` + `Scheduler` trio behind a
//! small builder, so callers don't have to hand-assemble the pieces in
//! the right order.

use std::sync::Arc;

use cronx_store::CronxStore;

use crate::config::SchedulerConfig;
use crate::error::RunnerError;
use crate::executor::Executor;
use crate::job_source::JobSource;
use crate::runner::Runner;
use crate::scheduler::Scheduler;

/// Builds a ready-to-start [`Scheduler`] from a [`JobSource`], an
/// [`Executor`], and ambient [`SchedulerConfig`].
pub struct CronxBuilder {
    config: SchedulerConfig,
    executor: Option<Box<dyn Executor>>,
}

impl CronxBuilder {
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config, executor: None }
    }

    /// Sets the executor backing the runner. Required before `build`.
    #[must_use]
    pub fn with_executor(mut self, executor: Box<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Opens the store, constructs the runner, and returns a `Scheduler`
    /// over `source`'s jobs — not yet started.
    pub async fn build(self, source: &dyn JobSource) -> Result<Scheduler, RunnerError> {
        let executor = self
            .executor
            .expect("CronxBuilder::with_executor must be called before build");

        let store = Arc::new(CronxStore::open(&self.config.store_path).await?);
        let runner = Arc::new(Runner::new(executor));

        Ok(Scheduler::new(source.jobs(), store, runner, self.config.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TriggerOutcome;
    use crate::job_source::StaticJobSource;
    use async_trait::async_trait;
    use cronx_core::{Action, IntervalConfig, Priority, StrategyConfig};
    use std::time::Duration;

    struct NoopExecutor;

    #[async_trait]
    impl Executor for NoopExecutor {
        async fn trigger(
            &self,
            _message: &str,
            _priority: Priority,
            _context: Option<&cronx_core::DeliveryHints>,
            _timeout: Duration,
        ) -> TriggerOutcome {
            TriggerOutcome {
                success: true,
                message: None,
                error: None,
            }
        }

        async fn notify(&self, _message: &str, _priority: Priority) -> Result<(), String> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_builder_assembles_scheduler() {
        let job = cronx_core::Job {
            name: "nudge".to_string(),
            strategy: StrategyConfig::Interval(IntervalConfig {
                min_secs: 60,
                max_secs: 120,
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
        };
        let source = StaticJobSource::new(vec![job]);
        let config = SchedulerConfig {
            store_path: ":memory:".to_string(),
            seed: Some("builder-test".to_string()),
        };

        let scheduler = CronxBuilder::new(config)
            .with_executor(Box::new(NoopExecutor))
            .build(&source)
            .await
            .unwrap();

        assert!(!scheduler.is_running());
    }
}
