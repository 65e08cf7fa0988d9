//! Raw tabular input
//!
//! One [`RawTable`] holds every sampled point of a processing unit. The unit
//! code is not stored anywhere explicitly; it is embedded in the name of the
//! flowpath group column (`fp070801050306`, sometimes `fp070801050306_tif`),
//! and the other per-unit columns are derived from it.

use crate::error::{FlowpathError, ImportError, ImportResult};
use crate::models::{PointRecord, Position};
use serde_json::{Map, Value};

/// Length of a unit (HUC12) code
pub const UNIT_CODE_LEN: usize = 12;

const GROUP_SUFFIX: &str = "_tif";

pub const SOIL_COLUMN: &str = "SOL_FY_2022";
pub const LANDUSE_COLUMN: &str = "landuse";
pub const MANAGEMENT_COLUMN: &str = "management";
pub const GENLU_COLUMN: &str = "GenLU";
pub const FIELD_BOUNDARY_COLUMN: &str = "FBndID";
pub const IRRIGATED_COLUMN: &str = "irrigated";

/// One raw record: attribute columns plus an optional point position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub properties: Map<String, Value>,
    pub position: Option<Position>,
}

impl RawRow {
    pub fn new(properties: Map<String, Value>, position: Option<Position>) -> Self {
        Self {
            properties,
            position,
        }
    }

    fn value(&self, column: &str) -> Option<&Value> {
        self.properties.get(column).filter(|v| !v.is_null())
    }
}

/// Every raw record of one processing unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Where the table came from, for log messages
    pub name: String,
    /// Column names in input order
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table, taking the column order from first appearance in `rows`
    pub fn from_rows(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.properties.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column names of one unit, derived from its code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitColumns {
    pub huc12: String,
    pub group: String,
    pub length: String,
    pub elevation: String,
    pub grid_order: String,
}

impl UnitColumns {
    /// Derive the unit code from the first column named `<prefix><12-digit code>`
    /// (with an optional `_tif` suffix)
    pub fn discover(table: &RawTable, prefix: &str) -> ImportResult<Self> {
        table
            .columns
            .iter()
            .find_map(|column| {
                let code = column.strip_prefix(prefix)?;
                let code = code.strip_suffix(GROUP_SUFFIX).unwrap_or(code);
                is_unit_code(code).then(|| Self::for_unit(code, column, prefix))
            })
            .ok_or_else(|| ImportError::UnknownGroup {
                columns: table.columns.clone(),
            })
    }

    fn for_unit(huc12: &str, group: &str, prefix: &str) -> Self {
        Self {
            huc12: huc12.to_string(),
            group: group.to_string(),
            length: format!("{}Len{}", prefix, huc12),
            elevation: format!("ep3m{}", huc12),
            grid_order: format!("gord_{}", huc12),
        }
    }

    /// Every column a unit cannot be processed without
    pub fn require(&self, table: &RawTable) -> ImportResult<()> {
        let required = [
            self.length.as_str(),
            self.elevation.as_str(),
            self.grid_order.as_str(),
            GENLU_COLUMN,
            FIELD_BOUNDARY_COLUMN,
        ];
        match required.into_iter().find(|c| !table.has_column(c)) {
            Some(column) => Err(ImportError::MissingColumn {
                huc12: self.huc12.clone(),
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Flowpath number of a row; `None` when the group column is empty
    pub fn group_of(&self, row: &RawRow) -> Option<i64> {
        row.value(&self.group).and_then(as_integer)
    }

    /// Convert one raw row into a point
    pub fn to_point(&self, row: &RawRow) -> Result<PointRecord, FlowpathError> {
        let group_id = self
            .group_of(row)
            .ok_or_else(|| malformed(&self.group, "missing flowpath number"))?;

        let cumulative_length = match row.value(&self.length) {
            None => None,
            Some(value) => Some(as_real(value).ok_or_else(|| malformed(&self.length, value))?),
        };

        let elevation = row
            .value(&self.elevation)
            .and_then(as_real)
            .ok_or_else(|| malformed(&self.elevation, "missing or not numeric"))?;

        let grid_order = optional_integer(row, &self.grid_order)?;
        let soil_code = optional_integer(row, SOIL_COLUMN)?;

        let position = row
            .position
            .ok_or_else(|| malformed("geometry", "record has no point geometry"))?;

        Ok(PointRecord {
            group_id,
            cumulative_length,
            elevation,
            grid_order,
            soil_code,
            land_use_rotation_string: text(row, LANDUSE_COLUMN),
            management_rotation_string: text(row, MANAGEMENT_COLUMN),
            is_irrigated: row.value(IRRIGATED_COLUMN).is_some_and(is_truthy),
            general_land_use_label: text(row, GENLU_COLUMN),
            field_boundary_id: text(row, FIELD_BOUNDARY_COLUMN),
            position,
        })
    }
}

fn is_unit_code(code: &str) -> bool {
    code.len() == UNIT_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

fn malformed(column: &str, reason: impl std::fmt::Display) -> FlowpathError {
    FlowpathError::MalformedRecord(format!("column '{}': {}", column, reason))
}

fn optional_integer(row: &RawRow, column: &str) -> Result<Option<i64>, FlowpathError> {
    match row.value(column) {
        None => Ok(None),
        Some(value) => as_integer(value)
            .map(Some)
            .ok_or_else(|| malformed(column, value)),
    }
}

fn text(row: &RawRow, column: &str) -> String {
    match row.value(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Numbers, or strings holding numbers
fn as_real(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integers; whole floats such as `12.0` are accepted
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    as_real(value)
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True" | "TRUE"),
        _ => false,
    }
}
