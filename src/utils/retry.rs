//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::interfaces::StorageError;

/// Backoff for store writes that hit a busy or locked database.
///
/// - Min delay: 10ms
/// - Max delay: 1s
/// - Max attempts: 8
/// - Jitter enabled
pub fn store_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(8)
        .with_jitter()
}

/// Determines if a storage error is transient.
///
/// Retryable:
/// - `Unavailable`: the backend reported itself temporarily unreachable
/// - SQLite `SQLITE_BUSY` / `SQLITE_LOCKED` and pool timeouts
///
/// Everything else (corrupt rows, constraint violations, serialization)
/// will fail the same way on retry.
pub fn is_transient(error: &StorageError) -> bool {
    match error {
        StorageError::Unavailable(_) => true,
        #[cfg(feature = "sqlite")]
        StorageError::Database(e) => is_transient_sqlx(e),
        _ => false,
    }
}

#[cfg(feature = "sqlite")]
fn is_transient_sqlx(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            // SQLITE_BUSY = 5, SQLITE_LOCKED = 6, plus their extended codes.
            db.code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| matches!(code & 0xff, 5 | 6))
                .unwrap_or(false)
        }
        _ => false,
    }
}
