//! Configuration loading and database path resolution
//!
//! Settings come from a small TOML file. The database location follows this
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "HILLFLOW_DATABASE";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Flowpath import tuning (optional)
    #[serde(default)]
    pub import: ImportSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Flowpath import settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Units processed per committed transaction
    pub commit_every: usize,
    /// Points with a grid order above this value are not persisted
    pub trunc_grid_order_at: i64,
    /// Flowpath groups with fewer raw points are skipped
    pub min_raw_points: usize,
    /// Prefix of the column carrying the flowpath number and unit code
    pub flowpath_column_prefix: String,
    /// Spatial reference id written into stored geometries
    pub srid: i32,
    /// File name prefix of importable sample files
    pub file_pattern_prefix: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            commit_every: 100,
            trunc_grid_order_at: 4,
            min_raw_points: 3,
            flowpath_column_prefix: "fp".to_string(),
            srid: 5070,
            file_pattern_prefix: "smpl3m_".to_string(),
        }
    }
}

impl ImportSettings {
    /// Reject settings that would make the import meaningless
    pub fn validate(&self) -> Result<()> {
        if self.commit_every == 0 {
            return Err(Error::Config("import.commit_every must be at least 1".to_string()));
        }
        if self.flowpath_column_prefix.is_empty() {
            return Err(Error::Config(
                "import.flowpath_column_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load TOML configuration from an explicit path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    config.import.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or from the default location when it exists,
/// or fall back to built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = path {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        _ => Ok(TomlConfig::default()),
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hillflow").join("config.toml"))
}

/// Resolve the database path: CLI → environment → TOML → OS default
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_data_folder().join("hillflow.db")
}

/// Get OS-dependent default data folder
fn get_default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hillflow"))
        .unwrap_or_else(|| PathBuf::from("./hillflow_data"))
}
