//! Error type for the pure scheduling core.

use thiserror::Error;

/// Errors produced by RNG construction, strategy evaluation, and job
/// validation. The core never touches I/O, so this enum stays small —
/// persistence and executor failures live in `cronx-store` and
/// `cronx-jobs` respectively.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A job or strategy field failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = CoreError::validation("min must be >= 1");
        assert!(err.to_string().contains("min must be >= 1"));
    }
}
