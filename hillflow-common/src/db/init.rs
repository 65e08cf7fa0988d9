//! Database initialization
//!
//! Opens (or creates) the SQLite database and makes sure the flowpath
//! tables exist. Table creation is idempotent, so every tool may call
//! [`init_database`] on startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    // The importer works on one connection at a time; a small pool is enough
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to a single connection so that every query sees the same data.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by the flowpath importer
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_flowpaths_table(pool).await?;
    create_flowpath_points_table(pool).await?;
    create_general_landuse_table(pool).await?;
    Ok(())
}

/// Flowpath identities, one per (scenario, huc_12, fpath)
pub async fn create_flowpaths_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flowpaths (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            scenario INTEGER NOT NULL,
            huc_12 TEXT NOT NULL,
            fpath INTEGER NOT NULL,
            geom TEXT,
            irrigated INTEGER,
            max_slope REAL,
            bulk_slope REAL,
            UNIQUE (scenario, huc_12, fpath)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Ordered per-segment rows owned by a flowpath
pub async fn create_flowpath_points_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flowpath_points (
            flowpath INTEGER NOT NULL REFERENCES flowpaths(fid),
            segid INTEGER NOT NULL,
            elevation REAL NOT NULL,
            length REAL NOT NULL,
            surgo INTEGER,
            management TEXT,
            slope REAL NOT NULL,
            geom TEXT NOT NULL,
            landuse TEXT,
            scenario INTEGER NOT NULL,
            gridorder INTEGER NOT NULL,
            genlu INTEGER NOT NULL,
            fbndid INTEGER NOT NULL,
            PRIMARY KEY (flowpath, segid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Label → code registry for general land use
pub async fn create_general_landuse_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS general_landuse (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_has_schema() {
        let pool = init_memory_database().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["flowpath_points", "flowpaths", "general_landuse"]);
    }

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
    }
}
