//! Test Helper Utilities
//!
//! Shared utilities for testing hillflow-import

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;
pub mod log_capture;

// Re-export commonly used items
pub use db_utils::{count_rows, create_test_db, load_unit};
pub use fixtures::{sample, straight_flowpath, unit_table, SampleRow, HUC12};
pub use log_capture::{capture_logs, LogCapture};
