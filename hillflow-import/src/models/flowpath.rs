//! Flowpath identities, derived geometry and persisted point rows

use super::point_record::Position;
use crate::error::FlowpathError;
use serde::{Deserialize, Serialize};

/// Identity of a flowpath: (scenario, huc-unit, flowpath number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowpathKey {
    pub scenario: i64,
    pub huc12: String,
    pub fpath: i64,
}

impl FlowpathKey {
    pub fn new(scenario: i64, huc12: impl Into<String>, fpath: i64) -> Self {
        Self {
            scenario,
            huc12: huc12.into(),
            fpath,
        }
    }
}

/// Ordered polyline with at least two distinct vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    vertices: Vec<Position>,
}

impl Polyline {
    /// Build a polyline, rejecting degenerate vertex lists
    pub fn new(vertices: Vec<Position>) -> Result<Self, FlowpathError> {
        if vertices.len() < 2 {
            return Err(FlowpathError::GeometricContradiction {
                reason: format!("polyline needs 2 vertices, got {}", vertices.len()),
                detail: format!("{:?}", vertices),
            });
        }
        let first = vertices[0];
        if vertices.iter().all(|v| *v == first) {
            return Err(FlowpathError::GeometricContradiction {
                reason: "all polyline vertices coincide".to_string(),
                detail: format!("{:?}", vertices),
            });
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }

    /// Extended WKT linestring with spatial reference id
    pub fn to_ewkt(&self, srid: i32) -> String {
        let coords = self
            .vertices
            .iter()
            .map(|p| format!("{} {}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SRID={};LINESTRING({})", srid, coords)
    }
}

/// Persisted per-segment record. Elevation and length are meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowpathPointRow {
    pub flowpath_id: i64,
    /// Position in the length-sorted order of all ordered points
    pub sequence_index: i64,
    pub elevation: f64,
    pub cumulative_length: f64,
    /// Slope to the next point, or the previous segment's slope for the last point
    pub slope: f64,
    pub soil_code: Option<i64>,
    pub management_rotation_string: String,
    pub position: Position,
    pub land_use_rotation_string: String,
    pub grid_order: i64,
    pub general_land_use_code: i64,
    pub field_boundary_index: i64,
}

/// Everything needed to persist one accepted flowpath
#[derive(Debug, Clone, PartialEq)]
pub struct PersistencePlan {
    pub flowpath_id: i64,
    pub rows: Vec<FlowpathPointRow>,
    pub geometry: Polyline,
    pub max_slope: f64,
    pub bulk_slope: f64,
    pub is_irrigated: bool,
}

/// Result of building a flowpath that did not hit a fatal error
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// At least two points survived truncation
    Accepted(PersistencePlan),
    /// Fewer than two points survived truncation; the identity must be deleted
    TooShort { retained: usize },
}

/// Flowpath identity row as stored
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredFlowpath {
    pub fid: i64,
    pub scenario: i64,
    pub huc_12: String,
    pub fpath: i64,
    pub geom: Option<String>,
    pub irrigated: Option<bool>,
    pub max_slope: Option<f64>,
    pub bulk_slope: Option<f64>,
}
