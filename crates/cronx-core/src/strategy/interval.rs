//! Interval strategy: a randomized delay between `min` and `max` seconds,
//! anchored at the last run but never scheduled in the past.

use super::IntervalConfig;
use crate::Rng;

pub fn calculate_next_run(config: &IntervalConfig, rng: &Rng, last_run: Option<i64>, now: i64) -> i64 {
    #[allow(clippy::cast_precision_loss)]
    let base = rng.uniform_random(config.min_secs as f64, config.max_secs as f64);
    let interval = if config.jitter > 0.0 {
        rng.jittered_value(base, config.jitter).max(0.0)
    } else {
        base
    };
    #[allow(clippy::cast_possible_truncation)]
    let delay_ms = (interval * 1000.0).floor() as i64;

    match last_run {
        None => now + delay_ms,
        Some(last) => (now + delay_ms).max(last + delay_ms),
    }
}
