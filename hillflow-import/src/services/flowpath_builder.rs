//! Flowpath construction
//!
//! **Algorithm:**
//! 1. Refuse the flowpath if any point lacks a cumulative length
//! 2. Sort by cumulative length (this order defines `sequence_index`)
//! 3. Resolve duplicate lengths with the [`Deduplicator`]
//! 4. Pair each point with its downstream neighbor (the previous point for
//!    the last one, so the final slope repeats the penultimate slope)
//! 5. Compute slope per pair; a zero horizontal step is fatal
//! 6. Drop points above the grid order threshold from the persisted set
//! 7. Fewer than two persisted points → too short
//! 8. Otherwise emit a [`PersistencePlan`]
//!
//! Lengths and elevations stay in centimeters until the rows are emitted,
//! where they are converted to meters.

use super::deduplicator::Deduplicator;
use crate::error::FlowpathError;
use crate::models::{
    BuildOutcome, FlowpathPointRow, PersistencePlan, PointRecord, Polyline, ProcessingCounts,
};
use hillflow_common::units::centimeters_to_meters;
use std::collections::HashMap;

/// Lookup of general land use codes by label
pub trait LandUseCodes {
    fn code_for(&self, label: &str) -> Option<i64>;
}

impl LandUseCodes for HashMap<String, i64> {
    fn code_for(&self, label: &str) -> Option<i64> {
        self.get(label).copied()
    }
}

/// Builds ordered flowpaths from unordered point samples
#[derive(Debug, Clone)]
pub struct FlowpathBuilder {
    deduplicator: Deduplicator,
    trunc_grid_order_at: i64,
}

impl FlowpathBuilder {
    /// Create a builder truncating points with grid order above `trunc_grid_order_at`
    pub fn new(trunc_grid_order_at: i64) -> Self {
        Self {
            deduplicator: Deduplicator::default(),
            trunc_grid_order_at,
        }
    }

    pub fn trunc_grid_order_at(&self) -> i64 {
        self.trunc_grid_order_at
    }

    /// Build the persistence plan for one flowpath
    ///
    /// `counts.flowpaths_deduped` is incremented whenever duplicate lengths
    /// were resolved, even if the flowpath is rejected afterwards.
    pub fn build(
        &self,
        points: &[PointRecord],
        flowpath_id: i64,
        codes: &impl LandUseCodes,
        counts: &mut ProcessingCounts,
    ) -> Result<BuildOutcome, FlowpathError> {
        let ordered = self.order(points, flowpath_id, counts)?;
        self.plan(&ordered, flowpath_id, codes)
    }

    /// Steps 1 to 3: refuse data gaps, sort and deduplicate
    pub fn order(
        &self,
        points: &[PointRecord],
        flowpath_id: i64,
        counts: &mut ProcessingCounts,
    ) -> Result<Vec<PointRecord>, FlowpathError> {
        let missing = points.iter().filter(|p| !p.is_usable()).count();
        if missing > 0 {
            tracing::warn!(
                fid = flowpath_id,
                missing,
                total = points.len(),
                "Null cumulative length, refusing flowpath"
            );
            return Err(FlowpathError::DataGap {
                missing,
                total: points.len(),
            });
        }

        let mut ordered: Vec<PointRecord> = points.to_vec();
        ordered.sort_by(|a, b| {
            a.cumulative_length
                .unwrap_or_default()
                .total_cmp(&b.cumulative_length.unwrap_or_default())
        });

        if let Some(outcome) = self.deduplicator.dedupe(&ordered) {
            counts.flowpaths_deduped += 1;
            tracing::debug!(
                fid = flowpath_id,
                rule = outcome.rule,
                before = ordered.len(),
                after = outcome.points.len(),
                "Deduplicated flowpath"
            );
            ordered = outcome.points;
        }
        Ok(ordered)
    }

    /// Points of an ordered flowpath that would be persisted
    pub fn retained<'a>(&self, ordered: &'a [PointRecord]) -> Vec<&'a PointRecord> {
        ordered
            .iter()
            .filter(|p| !p.is_truncated(self.trunc_grid_order_at))
            .collect()
    }

    /// Steps 4 to 8 over points already returned by [`Self::order`]
    pub fn plan(
        &self,
        ordered: &[PointRecord],
        flowpath_id: i64,
        codes: &impl LandUseCodes,
    ) -> Result<BuildOutcome, FlowpathError> {
        if ordered.len() < 2 {
            return Ok(BuildOutcome::TooShort {
                retained: self.retained(ordered).len(),
            });
        }

        let count = ordered.len();
        let mut rows = Vec::with_capacity(count);
        let mut vertices = Vec::with_capacity(count);
        let mut max_slope = 0.0_f64;
        let mut elev_change = 0.0_f64;
        let mut x_change = 0.0_f64;
        let mut is_irrigated = false;

        for (index, point) in ordered.iter().enumerate() {
            let is_last = index + 1 == count;
            let neighbor = if is_last {
                &ordered[index - 1]
            } else {
                &ordered[index + 1]
            };

            let length = point.length()?;
            let dx = (neighbor.length()? - length).abs();
            if dx == 0.0 {
                tracing::error!(
                    fid = flowpath_id,
                    sequence_index = index,
                    point = ?point,
                    neighbor = ?neighbor,
                    "Duplicate point survived deduplication"
                );
                return Err(FlowpathError::GeometricContradiction {
                    reason: format!("zero horizontal distance at sequence index {}", index),
                    detail: format!("{:?}\n{:?}", point, neighbor),
                });
            }
            let dy = (point.elevation - neighbor.elevation).abs();
            // The repeated last segment supplies a slope, not extra extent
            if !is_last {
                elev_change += dy;
                x_change += dx;
            }

            if point.is_truncated(self.trunc_grid_order_at) {
                continue;
            }
            let Some(grid_order) = point.grid_order else {
                continue;
            };

            let slope = dy / dx;
            max_slope = max_slope.max(slope);
            is_irrigated |= point.is_irrigated;

            let general_land_use_code = codes
                .code_for(&point.general_land_use_label)
                .ok_or_else(|| {
                    FlowpathError::UnresolvedLandUse(point.general_land_use_label.clone())
                })?;

            rows.push(FlowpathPointRow {
                flowpath_id,
                sequence_index: index as i64,
                elevation: centimeters_to_meters(point.elevation),
                cumulative_length: centimeters_to_meters(length),
                slope,
                soil_code: point.soil_code,
                management_rotation_string: point.management_rotation_string.clone(),
                position: point.position,
                land_use_rotation_string: point.land_use_rotation_string.clone(),
                grid_order,
                general_land_use_code,
                field_boundary_index: point.field_boundary_index()?,
            });
            vertices.push(point.position);
        }

        if rows.len() < 2 {
            tracing::info!(
                fid = flowpath_id,
                retained = rows.len(),
                ordered = count,
                "Flowpath too short after grid order truncation"
            );
            return Ok(BuildOutcome::TooShort {
                retained: rows.len(),
            });
        }

        if x_change == 0.0 {
            tracing::error!(fid = flowpath_id, points = ?ordered, "x_change equals 0");
            return Err(FlowpathError::GeometricContradiction {
                reason: "zero total horizontal extent".to_string(),
                detail: format!("{:?}", ordered),
            });
        }

        let geometry = Polyline::new(vertices)?;

        Ok(BuildOutcome::Accepted(PersistencePlan {
            flowpath_id,
            rows,
            geometry,
            max_slope,
            bulk_slope: elev_change / x_change,
            is_irrigated,
        }))
    }
}
