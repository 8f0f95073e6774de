//! Common Result Type

use super::error::AppError;

/// Handler result type; the error side renders as `{"detail": …}`.
pub type AppResult<T> = Result<T, AppError>;
