//! Database contention retry policy
//!
//! Two kinds of database errors are worth retrying:
//! - "database is locked": another writer holds the SQLite lock
//! - unique constraint violations: another worker inserted the same row
//!   first, so re-reading will find it
//!
//! **Backoff Strategy:**
//! - Initial delay: 10ms
//! - Max delay: 1000ms
//! - Multiplier: 2.0 (exponential)

use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Whether another attempt is allowed after `attempt` failures
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Log and sleep before the next attempt
    pub async fn wait(&self, operation: &str, attempt: u32, err: &sqlx::Error) {
        let backoff = self.backoff(attempt);
        tracing::warn!(
            operation,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "Database contention, will retry after backoff"
        );
        tokio::time::sleep(backoff).await;
    }
}

/// SQLite reported the database as locked or busy
pub fn is_lock_error(err: &sqlx::Error) -> bool {
    err.to_string().contains("database is locked")
}

/// A unique constraint rejected the write
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

/// Lock and unique-constraint errors are retried, everything else fails immediately
pub fn is_retryable(err: &sqlx::Error) -> bool {
    is_lock_error(err) || is_unique_violation(err)
}
