//! Upper bound on the duration of a ledger operation.

use std::future::Future;
use std::time::Duration;

use tally_shared::{AppError, AppResult};

/// Runs `op` and gives up after `limit`.
///
/// Dropping the unfinished future drops any open transaction with it, which
/// rolls the transaction back.
///
/// # Errors
///
/// Returns the operation's own error, or `Internal` on expiry.
pub async fn with_deadline<T, F>(limit: Duration, op: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    if let Ok(result) = tokio::time::timeout(limit, op).await {
        result
    } else {
        tracing::warn!(limit = ?limit, "Ledger operation timed out");
        Err(AppError::Internal("operation timed out".to_string()))
    }
}
