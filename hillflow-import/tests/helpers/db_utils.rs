//! Database Test Utilities

use anyhow::Result;
use hillflow_import::db::flowpaths::{self, StoredPoint};
use hillflow_import::models::StoredFlowpath;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a temporary file-backed database with the schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_hillflow.db");
    let pool = hillflow_common::db::init_database(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Count rows of a table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {}", table);
    Ok(sqlx::query_scalar(&query).fetch_one(pool).await?)
}

/// Every flowpath of a unit with its points, ordered by flowpath number
pub async fn load_unit(
    pool: &SqlitePool,
    scenario: i64,
    huc12: &str,
) -> Result<Vec<(StoredFlowpath, Vec<StoredPoint>)>> {
    let mut conn = pool.acquire().await?;
    let mut unit = Vec::new();
    for flowpath in flowpaths::load_unit_flowpaths(&mut conn, scenario, huc12).await? {
        let points = flowpaths::load_points(&mut conn, flowpath.fid).await?;
        unit.push((flowpath, points));
    }
    Ok(unit)
}
