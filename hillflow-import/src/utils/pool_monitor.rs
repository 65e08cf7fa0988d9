//! Monitored batch transactions
//!
//! Wraps a pool transaction and logs how long the connection was held, so
//! oversized import batches show up in the logs.

use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::time::Instant;
use hillflow_common::{Error, Result};

/// Monitored transaction wrapper that logs acquisition and release timing
pub struct MonitoredTransaction<'c> {
    tx: Option<Transaction<'c, Sqlite>>,
    caller: &'static str,
    acquired_at: Instant,
}

impl<'c> MonitoredTransaction<'c> {
    fn new(tx: Transaction<'c, Sqlite>, caller: &'static str, acquired_at: Instant) -> Self {
        Self {
            tx: Some(tx),
            caller,
            acquired_at,
        }
    }

    /// Connection running this transaction
    pub fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| Error::Internal("Transaction already consumed".to_string()))
    }

    /// Commit the transaction and log release timing
    pub async fn commit(mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::Internal("Transaction already consumed".to_string()))?;

        tx.commit().await?;

        let held_ms = self.acquired_at.elapsed().as_millis();
        if held_ms > 30_000 {
            tracing::warn!(
                caller = self.caller,
                held_ms = held_ms as u64,
                "LONG TRANSACTION - consider a smaller commit interval"
            );
        } else {
            tracing::debug!(
                caller = self.caller,
                held_ms = held_ms as u64,
                "Connection released (commit)"
            );
        }

        Ok(())
    }

    /// Roll back the transaction and log release timing
    pub async fn rollback(mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::Internal("Transaction already consumed".to_string()))?;

        tx.rollback().await?;

        tracing::debug!(
            caller = self.caller,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Connection released (rollback)"
        );

        Ok(())
    }
}

impl<'c> Drop for MonitoredTransaction<'c> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // Dropping an open transaction rolls it back
            tracing::warn!(
                caller = self.caller,
                held_ms = self.acquired_at.elapsed().as_millis() as u64,
                "Transaction dropped without commit, batch rolled back"
            );
        }
    }
}

/// Begin a monitored transaction with connection pool timing logs
///
/// # Example
/// ```ignore
/// let mut tx = begin_monitored(&pool, "batch_orchestrator::run").await?;
/// db::flowpaths::purge_scenario_unit(tx.conn()?, 0, "070801050306").await?;
/// tx.commit().await?;
/// ```
pub async fn begin_monitored<'c>(
    pool: &'c sqlx::SqlitePool,
    caller: &'static str,
) -> Result<MonitoredTransaction<'c>> {
    let start = Instant::now();

    let tx = pool.begin().await?;

    let wait_ms = start.elapsed().as_millis();
    if wait_ms > 1000 {
        tracing::warn!(
            caller = caller,
            wait_ms = wait_ms as u64,
            "SLOW CONNECTION ACQUISITION - database may be held by another writer"
        );
    } else {
        tracing::debug!(caller = caller, wait_ms = wait_ms as u64, "Connection acquired");
    }

    Ok(MonitoredTransaction::new(tx, caller, Instant::now()))
}
