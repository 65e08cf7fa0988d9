//! General land use code registry
//!
//! Labels map to stable integer codes. The table in the database is the
//! authority; this registry caches it and mints codes for labels it has not
//! seen yet. Minting is a single `INSERT ... SELECT MAX(id) + 1` statement, so
//! two writers racing on the same label collide on the unique constraint
//! instead of producing two codes. The loser re-reads and uses the winner's
//! code.

use super::flowpath_builder::LandUseCodes;
use crate::db::landuse;
use crate::utils::db_retry::{is_retryable, RetryPolicy};
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Label → code cache backed by the `general_landuse` table
#[derive(Debug, Clone, Default)]
pub struct LandUseRegistry {
    codes: HashMap<String, i64>,
    policy: RetryPolicy,
}

impl LandUseRegistry {
    /// Load every known code
    pub async fn load(conn: &mut SqliteConnection) -> sqlx::Result<Self> {
        let codes: HashMap<String, i64> = landuse::load_all(conn).await?.into_iter().collect();
        tracing::debug!(known = codes.len(), "Loaded general land use codes");
        Ok(Self {
            codes,
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Code for `label`, minting and persisting a new one when unseen
    pub async fn ensure(&mut self, conn: &mut SqliteConnection, label: &str) -> sqlx::Result<i64> {
        if let Some(code) = self.codes.get(label) {
            return Ok(*code);
        }

        let mut attempt = 0;
        let code = loop {
            attempt += 1;

            // Another writer may have registered it since we loaded
            if let Some(code) = landuse::find_by_label(conn, label).await? {
                break code;
            }

            match landuse::insert_next(conn, label).await {
                Ok(code) => {
                    tracing::info!(label, code, "Registered new general land use code");
                    break code;
                }
                Err(e) if is_retryable(&e) && self.policy.allows_retry(attempt) => {
                    self.policy.wait("landuse::insert_next", attempt, &e).await;
                }
                Err(e) => return Err(e),
            }
        };

        self.codes.insert(label.to_string(), code);
        Ok(code)
    }

    /// Ensure every label in `labels`
    pub async fn ensure_all<'a, I>(
        &mut self,
        conn: &mut SqliteConnection,
        labels: I,
    ) -> sqlx::Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for label in labels {
            self.ensure(conn, label).await?;
        }
        Ok(())
    }
}

impl LandUseCodes for LandUseRegistry {
    fn code_for(&self, label: &str) -> Option<i64> {
        self.codes.get(label).copied()
    }
}
