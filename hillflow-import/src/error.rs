//! Error types for hillflow-import
//!
//! Two scopes:
//! - [`FlowpathError`] fails one flowpath. The orchestrator catches it at the
//!   per-group boundary, deletes that flowpath and moves on.
//! - [`ImportError`] fails a whole unit (or the run) and reaches the caller.

use thiserror::Error;

/// Failure confined to a single flowpath
#[derive(Debug, Error)]
pub enum FlowpathError {
    /// A point has no cumulative length, so distance ordering is impossible
    #[error("Data gap: {missing} of {total} points have no cumulative length")]
    DataGap { missing: usize, total: usize },

    /// Zero horizontal distance where the geometry requires a positive one
    #[error("Geometric contradiction: {reason}\n{detail}")]
    GeometricContradiction { reason: String, detail: String },

    /// A raw record could not be read as a point
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A land-use label has no registered code
    #[error("No general land use code registered for label '{0}'")]
    UnresolvedLandUse(String),

    /// Persisting the flowpath failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Shared-library error while persisting
    #[error("Common error: {0}")]
    Common(#[from] hillflow_common::Error),
}

/// Failure of a processing unit or of the whole run
#[derive(Debug, Error)]
pub enum ImportError {
    /// No column yields a unit code
    #[error("Could not find huc12 from columns {columns:?}")]
    UnknownGroup { columns: Vec<String> },

    /// A per-unit column derived from the unit code is absent
    #[error("Unit {huc12} is missing column '{column}'")]
    MissingColumn { huc12: String, column: String },

    /// Input file could not be parsed
    #[error("Invalid input in {source_name}: {message}")]
    InvalidInput { source_name: String, message: String },

    /// Database error outside any single flowpath
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// hillflow-common error
    #[error("Common error: {0}")]
    Common(#[from] hillflow_common::Error),
}

/// Result type for unit- and run-level operations
pub type ImportResult<T> = Result<T, ImportError>;
