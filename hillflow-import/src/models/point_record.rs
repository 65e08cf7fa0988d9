//! Hillslope point samples
//!
//! A [`PointRecord`] is one sampled location along a candidate flowpath.
//! Cumulative length and elevation are raw centimeters (see
//! `hillflow_common::units`).

use crate::error::FlowpathError;
use serde::{Deserialize, Serialize};

/// Projected 2-D coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Extended WKT point with spatial reference id
    pub fn to_ewkt(&self, srid: i32) -> String {
        format!("SRID={};POINT({} {})", srid, self.x, self.y)
    }
}

/// One sample along a flowpath
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// Flowpath number within the unit
    pub group_id: i64,
    /// Distance from the flowpath head in centimeters; `None` marks a sampling gap
    pub cumulative_length: Option<f64>,
    /// Elevation in centimeters
    pub elevation: f64,
    /// Terrain-derived rank used to truncate distal points
    pub grid_order: Option<i64>,
    pub soil_code: Option<i64>,
    pub land_use_rotation_string: String,
    pub management_rotation_string: String,
    pub is_irrigated: bool,
    pub general_land_use_label: String,
    /// Field boundary identifier, `<something>_<index>`
    pub field_boundary_id: String,
    pub position: Position,
}

impl PointRecord {
    /// A point without a finite cumulative length cannot be ordered
    pub fn is_usable(&self) -> bool {
        self.cumulative_length.is_some_and(f64::is_finite)
    }

    /// Cumulative length, or a data gap error for unusable points
    pub fn length(&self) -> Result<f64, FlowpathError> {
        match self.cumulative_length {
            Some(length) if length.is_finite() => Ok(length),
            _ => Err(FlowpathError::DataGap {
                missing: 1,
                total: 1,
            }),
        }
    }

    /// Integer index following the first `_` of the field boundary id
    pub fn field_boundary_index(&self) -> Result<i64, FlowpathError> {
        self.field_boundary_id
            .split('_')
            .nth(1)
            .and_then(|index| index.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                FlowpathError::MalformedRecord(format!(
                    "field boundary id '{}' has no numeric index",
                    self.field_boundary_id
                ))
            })
    }

    /// Whether this point is left out of the persisted point set
    pub fn is_truncated(&self, trunc_grid_order_at: i64) -> bool {
        match self.grid_order {
            Some(order) => order > trunc_grid_order_at,
            None => true,
        }
    }
}
