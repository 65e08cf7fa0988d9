//! Flowpath construction services

pub mod batch_orchestrator;
pub mod deduplicator;
pub mod flowpath_builder;
pub mod landuse_registry;

pub use batch_orchestrator::{BatchOrchestrator, RunReport};
pub use deduplicator::{DedupOutcome, DedupRule, Deduplicator, GroupCensus, Resolution};
pub use flowpath_builder::{FlowpathBuilder, LandUseCodes};
pub use landuse_registry::LandUseRegistry;
