//! Result type alias for the core.

use crate::CoreError;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
