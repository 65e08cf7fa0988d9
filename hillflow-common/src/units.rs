//! Sample units for lengths and elevations
//!
//! Hillslope samples arrive with cumulative length and elevation in
//! centimeters. Everything inside the import pipeline (ordering, slopes,
//! elevation and length accumulation) works on centimeters; the conversion
//! to meters happens exactly once, when a point row is written.
//!
//! ```text
//! raw sample (cm)
//!     ↓
//! ordering / slope math (cm, slope is unitless)
//!     ↓
//! centimeters_to_meters() → flowpath_points.elevation / .length (m)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use hillflow_common::units::*;
//!
//! assert_eq!(centimeters_to_meters(12_345.0), 123.45);
//! ```

/// Centimeters in one meter
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// Convert a raw sample value (cm) to the persisted unit (m)
#[inline]
pub fn centimeters_to_meters(cm: f64) -> f64 {
    cm / CENTIMETERS_PER_METER
}
