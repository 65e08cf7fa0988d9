//! Batch import orchestration
//!
//! **Per unit:** purge prior rows → group by flowpath number → build each
//! group → persist it or delete its identity.
//!
//! **Error boundaries:**
//! - A [`FlowpathError`] fails one group. Its identity is deleted and the
//!   next group is processed.
//! - An [`ImportError`] fails the unit. [`BatchOrchestrator::run`] stops and
//!   returns it; the open batch rolls back, earlier batches stay committed.
//!
//! Units are committed in batches of `commit_every`. Re-running a unit purges
//! and rebuilds it, so an interrupted run is repaired by running it again.

use super::flowpath_builder::FlowpathBuilder;
use super::landuse_registry::LandUseRegistry;
use crate::db::flowpaths;
use crate::error::{FlowpathError, ImportResult};
use crate::models::{BuildOutcome, FlowpathKey, PersistencePlan, ProcessingCounts};
use crate::source::{RawRow, RawTable, UnitColumns};
use crate::utils::begin_monitored;
use chrono::{DateTime, Utc};
use hillflow_common::config::ImportSettings;
use serde::Serialize;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;

/// Result of a whole import run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub counts: ProcessingCounts,
    /// Codes of the units whose input held at least one record, in input order
    pub units: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Manifest file content, one unit code per line
    pub fn manifest(&self) -> String {
        self.units.iter().map(|u| format!("{}\n", u)).collect()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// What happened to one flowpath group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOutcome {
    Imported,
    TooShort,
}

/// Runs the import over a sequence of units
pub struct BatchOrchestrator {
    pool: SqlitePool,
    settings: ImportSettings,
    builder: FlowpathBuilder,
}

impl BatchOrchestrator {
    pub fn new(pool: SqlitePool, settings: ImportSettings) -> Self {
        let builder = FlowpathBuilder::new(settings.trunc_grid_order_at);
        Self {
            pool,
            settings,
            builder,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import every unit for `scenario`
    ///
    /// Units are read lazily from `units`; a read error stops the run like
    /// any other unit-level error.
    pub async fn run<I>(&self, scenario: i64, units: I) -> ImportResult<RunReport>
    where
        I: IntoIterator<Item = ImportResult<RawTable>>,
    {
        let started_at = Utc::now();
        let commit_every = self.settings.commit_every.max(1);
        let mut counts = ProcessingCounts::default();
        let mut manifest = Vec::new();

        let mut tx = begin_monitored(&self.pool, "batch_orchestrator::run").await?;
        let mut registry = LandUseRegistry::load(tx.conn()?).await?;

        for (index, unit) in units.into_iter().enumerate() {
            if index > 0 && index % commit_every == 0 {
                tx.commit().await?;
                tracing::info!(scenario, units = index, "Committed batch");
                tx = begin_monitored(&self.pool, "batch_orchestrator::run").await?;
            }

            let table = unit?;
            let identified = self
                .process_unit(tx.conn()?, scenario, &table, &mut registry, &mut counts)
                .await?;

            // Empty inputs are not worth scheduling downstream
            if let Some(huc12) = identified {
                if !table.is_empty() {
                    manifest.push(huc12);
                }
            }
        }

        tx.commit().await?;

        let report = RunReport {
            counts,
            units: manifest,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            scenario,
            units = report.units.len(),
            summary = %report.counts.display_string(),
            elapsed_s = report.elapsed_seconds(),
            "Import run complete"
        );
        Ok(report)
    }

    /// Import one unit inside the caller's transaction
    ///
    /// Returns the unit code, or `None` for an input with no records and no
    /// recognizable columns.
    pub async fn process_unit(
        &self,
        conn: &mut SqliteConnection,
        scenario: i64,
        table: &RawTable,
        registry: &mut LandUseRegistry,
        counts: &mut ProcessingCounts,
    ) -> ImportResult<Option<String>> {
        if table.is_empty() && table.columns.is_empty() {
            tracing::info!(source = %table.name, "No records, skipping unit");
            return Ok(None);
        }

        let columns = UnitColumns::discover(table, &self.settings.flowpath_column_prefix)?;
        let huc12 = columns.huc12.clone();

        let purged = flowpaths::purge_scenario_unit(conn, scenario, &huc12).await?;
        tracing::debug!(
            scenario,
            huc12 = %huc12,
            flowpaths = purged.flowpaths,
            points = purged.points,
            "Purged previous unit content"
        );

        if table.is_empty() {
            counts.units_processed += 1;
            return Ok(Some(huc12));
        }
        columns.require(table)?;

        let mut groups: BTreeMap<i64, Vec<&RawRow>> = BTreeMap::new();
        let mut ungrouped = 0usize;
        for row in &table.rows {
            match columns.group_of(row) {
                Some(fpath) => groups.entry(fpath).or_default().push(row),
                None => ungrouped += 1,
            }
        }
        if ungrouped > 0 {
            tracing::debug!(
                huc12 = %huc12,
                rows = ungrouped,
                "Rows without flowpath number ignored"
            );
        }

        for (fpath, rows) in groups {
            // Known upstream noise
            if fpath == 0 || rows.len() < self.settings.min_raw_points {
                counts.groups_skipped += 1;
                tracing::debug!(
                    huc12 = %huc12,
                    flowpath = fpath,
                    points = rows.len(),
                    "Skipping group"
                );
                continue;
            }

            let key = FlowpathKey::new(scenario, &huc12, fpath);
            let fid = flowpaths::get_or_create(conn, &key).await?;

            match self
                .process_group(conn, scenario, fid, &columns, &rows, registry, counts)
                .await
            {
                Ok(GroupOutcome::Imported) => counts.flowpaths_imported += 1,
                Ok(GroupOutcome::TooShort) => {
                    flowpaths::delete(conn, fid).await?;
                    counts.flowpaths_too_short += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        scenario,
                        huc12 = %huc12,
                        flowpath = fpath,
                        fid,
                        error = %e,
                        "Flowpath failed, deleting"
                    );
                    flowpaths::delete(conn, fid).await?;
                    counts.flowpaths_failed += 1;
                }
            }
        }

        counts.units_processed += 1;
        tracing::info!(scenario, huc12 = %huc12, source = %table.name, "Processed unit");
        Ok(Some(huc12))
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_group(
        &self,
        conn: &mut SqliteConnection,
        scenario: i64,
        fid: i64,
        columns: &UnitColumns,
        rows: &[&RawRow],
        registry: &mut LandUseRegistry,
        counts: &mut ProcessingCounts,
    ) -> Result<GroupOutcome, FlowpathError> {
        let points = rows
            .iter()
            .map(|row| columns.to_point(row))
            .collect::<Result<Vec<_>, _>>()?;

        let ordered = self.builder.order(&points, fid, counts)?;

        // Codes are minted only for points that can be persisted, and outside
        // the savepoint so a rolled back flowpath never leaves the registry
        // cache ahead of the table
        let retained = self.builder.retained(&ordered);
        if retained.len() >= 2 {
            let labels = retained.iter().map(|p| p.general_land_use_label.as_str());
            registry.ensure_all(conn, labels).await?;
        }

        let plan = match self.builder.plan(&ordered, fid, &*registry)? {
            BuildOutcome::Accepted(plan) => plan,
            BuildOutcome::TooShort { retained } => {
                tracing::debug!(fid, retained, "Flowpath too short, deleting");
                return Ok(GroupOutcome::TooShort);
            }
        };

        let mut savepoint = conn.begin().await?;
        match self.persist(&mut savepoint, scenario, &plan).await {
            Ok(()) => savepoint.commit().await?,
            Err(e) => {
                savepoint.rollback().await?;
                return Err(e);
            }
        }

        tracing::debug!(
            fid,
            points = plan.rows.len(),
            max_slope = plan.max_slope,
            bulk_slope = plan.bulk_slope,
            "Flowpath stored"
        );
        Ok(GroupOutcome::Imported)
    }

    async fn persist(
        &self,
        conn: &mut SqliteConnection,
        scenario: i64,
        plan: &PersistencePlan,
    ) -> Result<(), FlowpathError> {
        let fid = plan.flowpath_id;
        flowpaths::replace_points(conn, fid, scenario, self.settings.srid, &plan.rows).await?;
        flowpaths::apply_geometry(
            conn,
            fid,
            &plan.geometry,
            self.settings.srid,
            plan.is_irrigated,
            plan.max_slope,
            plan.bulk_slope,
        )
        .await?;
        Ok(())
    }
}
