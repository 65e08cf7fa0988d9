//! hillflow-import - flowpath import tool
//!
//! `import` builds flowpaths for a scenario from a directory of
//! `smpl3m_*.json` sample files and writes a manifest of the units found.
//! `purge` removes every flowpath of one unit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hillflow_common::config::{self, TomlConfig, DATABASE_ENV_VAR};
use hillflow_import::db::{self, flowpaths};
use hillflow_import::source::{discover_input_files, read_geojson};
use hillflow_import::utils::begin_monitored;
use hillflow_import::BatchOrchestrator;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hillflow-import
#[derive(Parser, Debug)]
#[command(name = "hillflow-import")]
#[command(about = "Build ordered hillslope flowpaths from sampled points")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "HILLFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides HILLFLOW_DATABASE and the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import every sample file of a directory into a scenario
    Import {
        scenario: i64,

        /// Directory holding the sample files
        datadir: PathBuf,

        /// Where to write the list of imported unit codes
        #[arg(long, default_value = "myhucs.txt")]
        manifest: PathBuf,

        /// Units per committed transaction
        #[arg(long)]
        commit_every: Option<usize>,
    },

    /// Delete every flowpath of one unit and scenario
    Purge { huc12: String, scenario: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut toml_config =
        config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hillflow_import={0},hillflow_common={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path =
        config::resolve_database_path(cli.database.as_deref(), DATABASE_ENV_VAR, &toml_config);
    info!("Database: {}", db_path.display());

    match cli.command {
        Command::Import {
            scenario,
            datadir,
            manifest,
            commit_every,
        } => {
            if let Some(n) = commit_every {
                toml_config.import.commit_every = n;
                toml_config.import.validate()?;
            }
            import(&toml_config, &db_path, scenario, &datadir, &manifest).await
        }
        Command::Purge { huc12, scenario } => purge(&db_path, &huc12, scenario).await,
    }
}

async fn import(
    config: &TomlConfig,
    db_path: &Path,
    scenario: i64,
    datadir: &Path,
    manifest: &Path,
) -> Result<()> {
    let settings = config.import.clone();
    info!(
        "Geometries are written as SRID {}; the sample files must use that grid",
        settings.srid
    );

    let files = discover_input_files(datadir, &settings.file_pattern_prefix)
        .with_context(|| format!("Failed to list sample files in {}", datadir.display()))?;
    info!("Found {} sample files in {}", files.len(), datadir.display());

    let pool = db::init_database(db_path)
        .await
        .context("Failed to open database")?;

    let total = files.len();
    let units = files.iter().enumerate().map(|(i, path)| {
        info!("[{}/{}] {}", i + 1, total, path.display());
        read_geojson(path)
    });

    let orchestrator = BatchOrchestrator::new(pool.clone(), settings);
    let report = orchestrator
        .run(scenario, units)
        .await
        .context("Import failed")?;

    std::fs::write(manifest, report.manifest())
        .with_context(|| format!("Failed to write manifest {}", manifest.display()))?;
    info!("Wrote {} unit codes to {}", report.units.len(), manifest.display());

    println!("{}", report.counts);

    pool.close().await;
    Ok(())
}

async fn purge(db_path: &Path, huc12: &str, scenario: i64) -> Result<()> {
    let pool = db::init_database(db_path)
        .await
        .context("Failed to open database")?;

    let mut tx = begin_monitored(&pool, "main::purge").await?;
    let removed = flowpaths::purge_scenario_unit(tx.conn()?, scenario, huc12)
        .await
        .context("Purge failed")?;
    tx.commit().await?;

    info!(
        "Removed {} flowpaths and {} points of {} (scenario {})",
        removed.flowpaths, removed.points, huc12, scenario
    );

    pool.close().await;
    Ok(())
}
