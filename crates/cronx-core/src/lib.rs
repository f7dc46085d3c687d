//! # cronx-core
//!
//! Pure scheduling core for CRONX: the RNG, the three scheduling
//! strategies, and the job data model. No I/O lives here — persistence
//! is `cronx-store`, execution is `cronx-jobs`.

pub mod error;
pub mod job;
pub mod result;
pub mod rng;
pub mod strategy;
pub mod telemetry;
pub mod validation;

pub use error::CoreError;
pub use job::{Action, BackoffKind, DeliveryHints, Job, JobState, OnFailure, Priority, RetryConfig, RunRecord, RunStatus};
pub use result::CoreResult;
pub use rng::Rng;
pub use strategy::{Distribution, IntervalConfig, ProbabilisticConfig, Strategy, StrategyConfig, WindowConfig};
pub use telemetry::{init_tracing, TelemetryConfig};
