//! Retry policy for the background loops.
//!
//! Repositories surface every storage error as-is. Deciding whether a busy
//! or locked database is worth another attempt belongs to the loop that
//! issued the call, so the delivery and collection tasks wrap their storage
//! calls with [`with_retry`].

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Maximum number of retry attempts for a single operation
pub const MAX_RETRIES: u32 = 5;

/// Whether another attempt could plausibly succeed
///
/// This includes a pool acquire timeout and these SQLite codes:
/// - SQLITE_BUSY (5): Database locked by another connection
/// - SQLITE_LOCKED (6): Database table is locked
/// - SQLITE_IOERR (10): Base I/O error
/// - SQLITE_IOERR_READ (266)
/// - SQLITE_IOERR_SHORT_READ (522)
/// - SQLITE_BUSY_SNAPSHOT (1032)
/// - SQLITE_IOERR_WRITE (2314)
/// - SQLITE_IOERR_FSYNC (3338)
/// - SQLITE_IOERR_LOCK (5386)
pub fn is_transient_error(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::PoolTimedOut) => true,
        Error::Database(sqlx::Error::Database(db_err)) => {
            let code = db_err.code().map(|c| c.to_string());
            matches!(
                code.as_deref(),
                Some("5")     // SQLITE_BUSY
                | Some("6")   // SQLITE_LOCKED
                | Some("10")  // SQLITE_IOERR
                | Some("266") // SQLITE_IOERR_READ
                | Some("522") // SQLITE_IOERR_SHORT_READ
                | Some("1032") // SQLITE_BUSY_SNAPSHOT
                | Some("2314") // SQLITE_IOERR_WRITE
                | Some("3338") // SQLITE_IOERR_FSYNC
                | Some("5386") // SQLITE_IOERR_LOCK
            )
        }
        _ => false,
    }
}

/// Calculate exponential backoff delay for retry attempt
///
/// Base delay: 200ms, doubling each attempt
/// Delays: 200ms, 400ms, 800ms, 1600ms, 3200ms
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(200 * 2u64.pow(attempt.saturating_sub(1)))
}

/// Run `operation`, retrying with exponential backoff while it fails with a
/// transient error. Any other error is returned on the spot.
pub async fn with_retry<F, Fut, T>(label: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if is_transient_error(&e) && attempts < MAX_RETRIES => {
                attempts += 1;
                let delay = backoff_delay(attempts);
                tracing::debug!(
                    error = %e,
                    operation = label,
                    attempt = attempts,
                    max_retries = MAX_RETRIES,
                    delay_ms = delay.as_millis(),
                    "Transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
