//! Convenience result type alias for TenantAuth.

use crate::error::AppError;

/// A specialized `Result` type for TenantAuth operations.
pub type AppResult<T> = Result<T, AppError>;
