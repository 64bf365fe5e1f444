//! Deadline enforcement for storage-bound steps.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;

/// Run `fut` with an upper bound of `limit`.
///
/// An elapsed deadline drops the future, which rolls back any transaction it
/// holds, and is reported as a retryable `Unavailable` error.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Storage operation timed out"
            );
            Err(AppError::unavailable(format!(
                "Operation '{operation}' timed out"
            )))
        }
    }
}
