//! Convenience result type alias for StarRelay.

use crate::error::AppError;

/// A specialized `Result` type for StarRelay operations.
pub type AppResult<T> = Result<T, AppError>;
