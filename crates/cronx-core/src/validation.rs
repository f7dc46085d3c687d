//! Validation rules for job and strategy fields.
//!
//! These are re-assertions, not the primary line of defense — the
//! upstream config loader is expected to have validated already — but
//! the core re-checks them so a test suite can target this module
//! directly without needing a YAML loader in the loop.

use crate::CoreError;

/// Validates an `HH:MM` window boundary (`^([01]?\d|2[0-3]):[0-5]\d$`).
pub fn valid_window_time(value: &str) -> Result<(), CoreError> {
    let (hour, minute) = value
        .split_once(':')
        .ok_or_else(|| CoreError::validation(format!("'{value}' is not HH:MM")))?;

    if hour.is_empty() || hour.len() > 2 || !hour.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(format!("'{value}' has an invalid hour")));
    }
    if minute.len() != 2 || !minute.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(format!("'{value}' has an invalid minute")));
    }

    let hour: u32 = hour.parse().expect("digits only");
    let minute: u32 = minute.parse().expect("digits only");

    if hour > 23 {
        return Err(CoreError::validation(format!("hour {hour} out of range 0-23")));
    }
    if minute > 59 {
        return Err(CoreError::validation(format!("minute {minute} out of range 0-59")));
    }
    Ok(())
}

/// Validates interval strategy bounds: `min >= 1`, `max >= min`.
pub fn valid_interval_bounds(min_secs: u64, max_secs: u64) -> Result<(), CoreError> {
    if min_secs < 1 {
        return Err(CoreError::validation("interval min must be >= 1 second"));
    }
    if max_secs < min_secs {
        return Err(CoreError::validation(format!(
            "interval max ({max_secs}) must be >= min ({min_secs})"
        )));
    }
    Ok(())
}

/// Validates a probability in `[0, 1]`.
pub fn valid_probability(p: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(CoreError::validation(format!("probability {p} out of range [0, 1]")));
    }
    Ok(())
}

/// Validates a jitter factor in `[0, 1]`.
pub fn valid_jitter(jitter: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&jitter) {
        return Err(CoreError::validation(format!("jitter {jitter} out of range [0, 1]")));
    }
    Ok(())
}

/// Validates that a probabilistic check interval is at least 1 second.
pub fn valid_check_interval(secs: u64) -> Result<(), CoreError> {
    if secs < 1 {
        return Err(CoreError::validation("checkInterval must be >= 1 second"));
    }
    Ok(())
}

/// Validates a session/transport URL: must be HTTPS unless the host is
/// `localhost` or `127.0.0.1`.
pub fn valid_session_url(url: &str) -> Result<(), CoreError> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if url.starts_with("http://localhost") || url.starts_with("http://127.0.0.1") {
        return Ok(());
    }
    Err(CoreError::validation(format!(
        "'{url}' must use https:// except for localhost/127.0.0.1"
    )))
}

/// Validates a session key is at least 8 characters.
pub fn valid_session_key(key: &str) -> Result<(), CoreError> {
    if key.len() < 8 {
        return Err(CoreError::validation("session key must be at least 8 characters"));
    }
    Ok(())
}
