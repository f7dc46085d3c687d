//! # cronx-jobs
//!
//! Fires CRONX jobs with retry/backoff and owns the per-job timers.
//!
//! `cronx-core` supplies the pure strategies and data model;
//! `cronx-store` supplies persistence. This crate is the stateful
//! conductor sitting on top of both: [`Runner`] fires one job once
//! (timeout, retry, backoff, failure notification) and [`Scheduler`]
//! owns one timer per job, re-arming it from the strategy's next run
//! after every fire.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Scheduler                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐        ┌─────────┐    │
//! │  │ timer:J1│  │ timer:J2│  │ timer:J3│  . . .  │ timer:Jn│    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘        └────┬────┘    │
//! │       │            │            │                   │         │
//! │       └────────────┴─────┬──────┴───────────────────┘         │
//! │                           ▼                                    │
//! │                       Runner::run                              │
//! │                           │                                    │
//! │              ┌────────────┴────────────┐                       │
//! │              ▼                         ▼                       │
//! │          Executor                 CronxStore                   │
//! │     (trigger / notify)        (job state, run history)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # use cronx_jobs::{CronxBuilder, SchedulerConfig, StaticJobSource, FileExecutor};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = FileExecutor::new("/tmp/cronx-triggers".into(), "agent-cli".to_string(), vec![]);
//! let source = StaticJobSource::new(vec![]);
//! let scheduler = CronxBuilder::new(SchedulerConfig::default())
//!     .with_executor(Box::new(executor))
//!     .build(&source)
//!     .await?;
//! scheduler.start().await?;
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod di;
pub mod error;
pub mod executor;
pub mod job_source;
pub mod runner;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use di::CronxBuilder;
pub use error::RunnerError;
pub use executor::{Executor, FileExecutor, HttpExecutor, TriggerOutcome};
pub use job_source::{JobSource, StaticJobSource};
pub use runner::{RunResult, Runner};
pub use scheduler::{JobStatus, Scheduler};
