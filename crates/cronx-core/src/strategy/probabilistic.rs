//! Probabilistic strategy: periodic coin flip.

use super::ProbabilisticConfig;
use crate::Rng;

/// Returns true with probability `config.probability`. The edge
/// probabilities 0 and 1 are resolved without consuming a draw, so a
/// deterministic seed's sequence is unaffected by a job's probability
/// setting.
pub fn should_run(config: &ProbabilisticConfig, rng: &Rng) -> bool {
    if config.probability <= 0.0 {
        return false;
    }
    if config.probability >= 1.0 {
        return true;
    }
    rng.next_f64() < config.probability
}

pub fn get_next_check_time(config: &ProbabilisticConfig, now: i64) -> i64 {
    now + (config.check_interval_secs as i64) * 1000
}
