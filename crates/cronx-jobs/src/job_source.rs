//! The seam where an external config loader hands the scheduler its
//! jobs. YAML loading and CLI plumbing are out of scope for this crate;
//! this trait is the minimal surface a loader must satisfy.

use cronx_core::Job;

/// Produces the list of validated jobs the scheduler should run.
/// Implementations outside this crate are expected to have already
/// validated each `Job`; the scheduler re-asserts the rules anyway via
/// `Job::validate` at `start()`.
pub trait JobSource: Send + Sync {
    fn jobs(&self) -> Vec<Job>;
}

/// An in-memory `JobSource` over a fixed list, used by tests and
/// examples in place of a real config loader.
pub struct StaticJobSource {
    jobs: Vec<Job>,
}

impl StaticJobSource {
    #[must_use]
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }
}

impl JobSource for StaticJobSource {
    fn jobs(&self) -> Vec<Job> {
        self.jobs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cronx_core::{Action, IntervalConfig, Priority, StrategyConfig};

    fn sample() -> Job {
        Job {
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
        }
    }

    #[test]
    fn test_static_job_source_returns_configured_jobs() {
        let source = StaticJobSource::new(vec![sample()]);
        let jobs = source.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "nudge");
    }
}
