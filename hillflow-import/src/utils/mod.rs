//! Utility modules for hillflow-import

pub mod db_retry;
pub mod pool_monitor;

pub use db_retry::RetryPolicy;
pub use pool_monitor::{begin_monitored, MonitoredTransaction};
