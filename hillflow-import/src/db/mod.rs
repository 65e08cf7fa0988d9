//! Database access for the import pipeline

pub mod flowpaths;
pub mod landuse;

pub use hillflow_common::db::{init_database, init_memory_database};
