//! # Hillflow Common Library
//!
//! Shared code for the hillflow tools including:
//! - Error type and result alias
//! - Configuration loading (TOML, environment, command line)
//! - Database initialization and schema
//! - Unit conversions for sampled lengths and elevations

pub mod config;
pub mod db;
pub mod error;
pub mod units;

pub use error::{Error, Result};
