//! Window strategy: pick a moment inside today's (or tomorrow's) daily
//! time-of-day interval.

use chrono::{Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use super::{Distribution, WindowConfig, WEIGHTED_SEGMENT_WEIGHTS};
use crate::{CoreError, Rng};

fn parse_hhmm(value: &str) -> Result<(u32, u32), CoreError> {
    let (h, m) = value
        .split_once(':')
        .ok_or_else(|| CoreError::validation(format!("'{value}' is not HH:MM")))?;
    let hour: u32 = h
        .parse()
        .map_err(|_| CoreError::validation(format!("'{value}' has a non-numeric hour")))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| CoreError::validation(format!("'{value}' has a non-numeric minute")))?;
    Ok((hour, minute))
}

pub fn calculate_next_run(config: &WindowConfig, rng: &Rng, now: i64) -> Result<i64, CoreError> {
    let tz: Tz = config
        .timezone
        .parse()
        .map_err(|_| CoreError::validation(format!("unknown timezone '{}'", config.timezone)))?;

    let (start_h, start_m) = parse_hhmm(&config.start)?;
    let (end_h, end_m) = parse_hhmm(&config.end)?;

    let now_dt = Utc
        .timestamp_millis_opt(now)
        .single()
        .ok_or_else(|| CoreError::validation(format!("timestamp {now} is out of range")))?
        .with_timezone(&tz);
    let date = now_dt.date_naive();

    let mut window_start = tz
        .with_ymd_and_hms(date.year(), date.month(), date.day(), start_h, start_m, 0)
        .single()
        .ok_or_else(|| CoreError::validation("window start is not a valid local time"))?;
    let mut window_end = tz
        .with_ymd_and_hms(date.year(), date.month(), date.day(), end_h, end_m, 0)
        .single()
        .ok_or_else(|| CoreError::validation("window end is not a valid local time"))?;

    if window_end <= window_start {
        window_end += Duration::days(1);
    }
    if now_dt > window_end {
        window_start += Duration::days(1);
        window_end += Duration::days(1);
    }

    let start_ms = window_start.timestamp_millis();
    let end_ms = window_end.timestamp_millis();

    #[allow(clippy::cast_precision_loss)]
    let offset_ms = match config.distribution {
        Distribution::Uniform => rng.uniform_random(start_ms as f64, end_ms as f64),
        Distribution::Gaussian => {
            let mid = (start_ms as f64 + end_ms as f64) / 2.0;
            let stddev = (end_ms - start_ms) as f64 / 6.0;
            let z = rng.gaussian_random();
            (mid + z * stddev).clamp(start_ms as f64, end_ms as f64)
        }
        Distribution::Weighted => {
            let segment = rng.weighted_random(&WEIGHTED_SEGMENT_WEIGHTS);
            let segment_len = (end_ms - start_ms) as f64 / WEIGHTED_SEGMENT_WEIGHTS.len() as f64;
            let segment_start = start_ms as f64 + segment_len * segment as f64;
            rng.uniform_random(segment_start, segment_start + segment_len)
        }
    };

    #[allow(clippy::cast_possible_truncation)]
    Ok(offset_ms.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn cfg(distribution: Distribution) -> WindowConfig {
        WindowConfig {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: "Asia/Jakarta".to_string(),
            distribution,
        }
    }

    #[test]
    fn test_containment_within_today_window() {
        let tz: Tz = "Asia/Jakarta".parse().unwrap();
        let now = tz.with_ymd_and_hms(2026, 7, 28, 10, 0, 0).unwrap();
        let rng = Rng::from_seed("win1");
        let next = calculate_next_run(&cfg(Distribution::Uniform), &rng, now.timestamp_millis()).unwrap();

        let window_start = tz.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap().timestamp_millis();
        let window_end = tz.with_ymd_and_hms(2026, 7, 28, 17, 0, 0).unwrap().timestamp_millis();
        assert!(next >= window_start && next <= window_end);
    }

    #[test]
    fn test_rolls_to_tomorrow_when_past_end() {
        let tz: Tz = "Asia/Jakarta".parse().unwrap();
        let now = tz.with_ymd_and_hms(2026, 7, 28, 18, 0, 0).unwrap();
        let rng = Rng::from_seed("win2");
        let next = calculate_next_run(&cfg(Distribution::Uniform), &rng, now.timestamp_millis()).unwrap();

        let tomorrow_start = tz.with_ymd_and_hms(2026, 7, 29, 9, 0, 0).unwrap().timestamp_millis();
        let tomorrow_end = tz.with_ymd_and_hms(2026, 7, 29, 17, 0, 0).unwrap().timestamp_millis();
        assert!(next >= tomorrow_start && next <= tomorrow_end);
    }

    #[test]
    fn test_gaussian_stays_in_window() {
        let tz: Tz = "Asia/Jakarta".parse().unwrap();
        let now = tz.with_ymd_and_hms(2026, 7, 28, 8, 0, 0).unwrap();
        let rng = Rng::from_seed("win-gauss");
        for i in 0..200 {
            let seeded = Rng::from_seed(&format!("win-gauss-{i}"));
            let next = calculate_next_run(&cfg(Distribution::Gaussian), &seeded, now.timestamp_millis()).unwrap();
            let window_start = tz.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap().timestamp_millis();
            let window_end = tz.with_ymd_and_hms(2026, 7, 28, 17, 0, 0).unwrap().timestamp_millis();
            assert!(next >= window_start && next <= window_end);
        }
        let _ = rng;
    }

    #[test]
    fn test_midnight_spanning_window() {
        let mut wrap = cfg(Distribution::Uniform);
        wrap.start = "22:00".to_string();
        wrap.end = "02:00".to_string();
        let tz: Tz = "Asia/Jakarta".parse().unwrap();
        let now = tz.with_ymd_and_hms(2026, 7, 28, 23, 0, 0).unwrap();
        let rng = Rng::from_seed("wrap");
        let next = calculate_next_run(&wrap, &rng, now.timestamp_millis()).unwrap();
        let window_start = tz.with_ymd_and_hms(2026, 7, 28, 22, 0, 0).unwrap().timestamp_millis();
        let window_end = tz.with_ymd_and_hms(2026, 7, 29, 2, 0, 0).unwrap().timestamp_millis();
        assert!(next >= window_start && next <= window_end);
    }
}
