//! Data models for flowpath import

pub mod flowpath;
pub mod point_record;
pub mod statistics;

pub use flowpath::{
    BuildOutcome, FlowpathKey, FlowpathPointRow, PersistencePlan, Polyline, StoredFlowpath,
};
pub use point_record::{PointRecord, Position};
pub use statistics::ProcessingCounts;
