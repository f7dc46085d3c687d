//! Scheduling strategies: pure functions from `(lastRun, now, rng)` to
//! `nextRun`. Represented as a tagged enum rather than a trait object
//! hierarchy — the probabilistic arm is the only one that needs the
//! extra `should_run`/`get_next_check_time` operations, and a match on
//! the tag expresses that better than forcing the other two arms to
//! implement methods they don't have.

mod interval;
mod probabilistic;
mod window;

use serde::{Deserialize, Serialize};

use crate::validation::{
    valid_check_interval, valid_interval_bounds, valid_jitter, valid_probability, valid_window_time,
};
use crate::{CoreError, Rng};

/// Shape of the offset drawn inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Uniform,
    Gaussian,
    Weighted,
}

/// Fixed segment weights for the weighted window distribution.
pub const WEIGHTED_SEGMENT_WEIGHTS: [f64; 7] = [0.05, 0.10, 0.20, 0.30, 0.20, 0.10, 0.05];

/// Daily time-of-day window, e.g. 09:00-17:00 in a given IANA zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
    pub timezone: String,
    pub distribution: Distribution,
}

impl WindowConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        valid_window_time(&self.start)?;
        valid_window_time(&self.end)?;
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| CoreError::validation(format!("unknown timezone '{}'", self.timezone)))?;
        Ok(())
    }
}

/// Randomized interval in seconds between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub min_secs: u64,
    pub max_secs: u64,
    pub jitter: f64,
}

impl IntervalConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        valid_interval_bounds(self.min_secs, self.max_secs)?;
        valid_jitter(self.jitter)?;
        Ok(())
    }
}

/// Periodic coin flip: check every `check_interval_secs`, fire with
/// probability `probability`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticConfig {
    pub check_interval_secs: u64,
    pub probability: f64,
}

impl ProbabilisticConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        valid_check_interval(self.check_interval_secs)?;
        valid_probability(self.probability)?;
        Ok(())
    }
}

/// Serializable, tag-dispatched strategy configuration — what a `Job`
/// carries at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategyConfig {
    Window(WindowConfig),
    Interval(IntervalConfig),
    Probabilistic(ProbabilisticConfig),
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            StrategyConfig::Window(c) => c.validate(),
            StrategyConfig::Interval(c) => c.validate(),
            StrategyConfig::Probabilistic(c) => c.validate(),
        }
    }
}

/// A live strategy instance: config plus the RNG that drives its draws.
/// One instance per job, constructed once at scheduler start — the RNG
/// is never shared across jobs.
pub enum Strategy {
    Window(WindowConfig, Rng),
    Interval(IntervalConfig, Rng),
    Probabilistic(ProbabilisticConfig, Rng),
}

impl Strategy {
    #[must_use]
    pub fn new(config: StrategyConfig, rng: Rng) -> Self {
        match config {
            StrategyConfig::Window(c) => Strategy::Window(c, rng),
            StrategyConfig::Interval(c) => Strategy::Interval(c, rng),
            StrategyConfig::Probabilistic(c) => Strategy::Probabilistic(c, rng),
        }
    }

    /// Computes the next fire timestamp (ms since epoch).
    pub fn calculate_next_run(&self, last_run: Option<i64>, now: i64) -> Result<i64, CoreError> {
        match self {
            Strategy::Window(c, rng) => window::calculate_next_run(c, rng, now),
            Strategy::Interval(c, rng) => Ok(interval::calculate_next_run(c, rng, last_run, now)),
            Strategy::Probabilistic(c, _rng) => Ok(probabilistic::get_next_check_time(c, now)),
        }
    }

    /// `Some(true/false)` for the probabilistic arm, `None` otherwise —
    /// callers check the tag (via this) before deciding whether to
    /// invoke the runner.
    #[must_use]
    pub fn should_run(&self) -> Option<bool> {
        match self {
            Strategy::Probabilistic(c, rng) => Some(probabilistic::should_run(c, rng)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_config_validate_interval() {
        let cfg = StrategyConfig::Interval(IntervalConfig {
            min_secs: 300,
            max_secs: 600,
            jitter: 0.1,
        });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_strategy_config_validate_window_rejects_bad_tz() {
        let cfg = StrategyConfig::Window(WindowConfig {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: "Not/AZone".to_string(),
            distribution: Distribution::Uniform,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_should_run_only_probabilistic() {
        let rng = Rng::from_seed("tag");
        let window = Strategy::new(
            StrategyConfig::Window(WindowConfig {
                start: "09:00".to_string(),
                end: "17:00".to_string(),
                timezone: "UTC".to_string(),
                distribution: Distribution::Uniform,
            }),
            rng,
        );
        assert_eq!(window.should_run(), None);

        let rng2 = Rng::from_seed("tag2");
        let prob = Strategy::new(
            StrategyConfig::Probabilistic(ProbabilisticConfig {
                check_interval_secs: 60,
                probability: 1.0,
            }),
            rng2,
        );
        assert_eq!(prob.should_run(), Some(true));
    }
}
