//! hillflow-import library interface
//!
//! Turns unordered hillslope point samples into ordered, validated
//! flowpaths and persists them. Exposed as a library so the command-line
//! tool and the integration tests share one implementation.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod source;
pub mod utils;

pub use crate::error::{FlowpathError, ImportError, ImportResult};
pub use crate::services::{BatchOrchestrator, RunReport};
