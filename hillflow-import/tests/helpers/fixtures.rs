//! Raw record fixtures
//!
//! Builds unit tables shaped like the GeoJSON sample files after reading:
//! per-unit columns named after the unit code plus the fixed attribute
//! columns.

use hillflow_import::models::Position;
use hillflow_import::source::{RawRow, RawTable};
use serde_json::{json, Value};

pub const HUC12: &str = "070801050306";

/// One raw sample, lengths and elevations in centimeters
#[derive(Debug, Clone)]
pub struct SampleRow {
    pub fpath: i64,
    pub length: Option<f64>,
    pub elevation: f64,
    pub grid_order: Option<i64>,
    pub field_boundary: String,
    pub genlu: String,
    pub irrigated: bool,
    pub position: Position,
}

/// A grid order 1 sample in field `F_1`, positioned along the x axis
pub fn sample(fpath: i64, length: Option<f64>, elevation: f64) -> SampleRow {
    SampleRow {
        fpath,
        length,
        elevation,
        grid_order: Some(1),
        field_boundary: "F_1".to_string(),
        genlu: "Cropland".to_string(),
        irrigated: false,
        position: Position::new(length.unwrap_or_default(), 4_000.0),
    }
}

impl SampleRow {
    pub fn grid_order(mut self, grid_order: Option<i64>) -> Self {
        self.grid_order = grid_order;
        self
    }

    pub fn field_boundary(mut self, id: &str) -> Self {
        self.field_boundary = id.to_string();
        self
    }

    pub fn genlu(mut self, label: &str) -> Self {
        self.genlu = label.to_string();
        self
    }

    pub fn irrigated(mut self) -> Self {
        self.irrigated = true;
        self
    }

    pub fn into_row(self, huc12: &str) -> RawRow {
        let mut properties = serde_json::Map::new();
        properties.insert(format!("fp{}", huc12), json!(self.fpath));
        properties.insert(format!("fpLen{}", huc12), json!(self.length));
        properties.insert(format!("ep3m{}", huc12), json!(self.elevation));
        properties.insert(format!("gord_{}", huc12), json!(self.grid_order));
        properties.insert("SOL_FY_2022".to_string(), json!(411_001));
        properties.insert("landuse".to_string(), Value::from("BCBCBCBCBC"));
        properties.insert("management".to_string(), Value::from("1111111111"));
        properties.insert("GenLU".to_string(), Value::from(self.genlu));
        properties.insert("FBndID".to_string(), Value::from(self.field_boundary));
        properties.insert("irrigated".to_string(), json!(i64::from(self.irrigated)));
        RawRow::new(properties, Some(self.position))
    }
}

/// Unit table from samples
pub fn unit_table(huc12: &str, samples: Vec<SampleRow>) -> RawTable {
    let rows = samples.into_iter().map(|s| s.into_row(huc12)).collect();
    RawTable::from_rows(format!("smpl3m_{}.json", huc12), rows)
}

/// `n` evenly spaced samples, 3 m apart, dropping 30 cm per step
pub fn straight_flowpath(fpath: i64, n: usize) -> Vec<SampleRow> {
    (0..n)
        .map(|i| sample(fpath, Some(i as f64 * 300.0), 30_000.0 - i as f64 * 30.0))
        .collect()
}
