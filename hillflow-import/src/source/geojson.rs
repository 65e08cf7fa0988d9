//! GeoJSON point sample reader
//!
//! Reads a FeatureCollection of Point features. Feature properties become
//! columns and the point coordinates become the row position. Two columns
//! are derived on read:
//! - `landuse` and `management` expand the 2021 rotation strings to cover
//!   the full simulation period (`s[1] s[0] s[1] s s[-2]`)
//! - `irrigated` defaults to 0 when the file has no such column

use super::table::{RawRow, RawTable, IRRIGATED_COLUMN, LANDUSE_COLUMN, MANAGEMENT_COLUMN};
use crate::error::{ImportError, ImportResult};
use crate::models::Position;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CROP_ROTATION_COLUMN: &str = "CropRotatn_CY_2021";
pub const MANAGEMENT_ROTATION_COLUMN: &str = "Management_CY_2021";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Read one GeoJSON file into a raw table
pub fn read_geojson(path: &Path) -> ImportResult<RawTable> {
    let content = std::fs::read_to_string(path)?;
    from_geojson_str(&path.display().to_string(), &content)
}

/// Parse GeoJSON text into a raw table
pub fn from_geojson_str(name: &str, content: &str) -> ImportResult<RawTable> {
    let collection: FeatureCollection = serde_json::from_str(content)?;

    let mut rows = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let position = match feature.geometry {
            None => None,
            Some(geometry) => Some(point_position(name, index, &geometry)?),
        };
        let mut properties = feature.properties.unwrap_or_default();
        derive_rotations(&mut properties);
        rows.push(RawRow::new(properties, position));
    }

    let mut table = RawTable::from_rows(name, rows);
    if !table.is_empty() && !table.has_column(IRRIGATED_COLUMN) {
        tracing::info!(source = name, "{} had no irrigated column", name);
        for row in &mut table.rows {
            row.properties
                .insert(IRRIGATED_COLUMN.to_string(), Value::from(0));
        }
        table.columns.push(IRRIGATED_COLUMN.to_string());
    }

    Ok(table)
}

fn point_position(name: &str, index: usize, geometry: &Geometry) -> ImportResult<Position> {
    if geometry.kind != "Point" {
        return Err(ImportError::InvalidInput {
            source_name: name.to_string(),
            message: format!("feature {} is a {} geometry, expected Point", index, geometry.kind),
        });
    }
    let coordinate = |i: usize| geometry.coordinates.get(i).and_then(Value::as_f64);
    match (coordinate(0), coordinate(1)) {
        (Some(x), Some(y)) => Ok(Position::new(x, y)),
        _ => Err(ImportError::InvalidInput {
            source_name: name.to_string(),
            message: format!("feature {} has no x/y coordinates", index),
        }),
    }
}

fn derive_rotations(properties: &mut Map<String, Value>) {
    for (source, target) in [
        (CROP_ROTATION_COLUMN, LANDUSE_COLUMN),
        (MANAGEMENT_ROTATION_COLUMN, MANAGEMENT_COLUMN),
    ] {
        if let Some(Value::String(rotation)) = properties.get(source) {
            let expanded = expand_rotation(rotation).map_or(Value::Null, Value::String);
            properties.insert(target.to_string(), expanded);
        }
    }
}

/// Extend a rotation string backwards two years and forward one year
///
/// `"ABCDEF"` becomes `"BAB" + "ABCDEF" + "E"`. Strings shorter than two
/// characters have nothing to repeat.
pub fn expand_rotation(rotation: &str) -> Option<String> {
    let chars: Vec<char> = rotation.chars().collect();
    if chars.len() < 2 {
        return None;
    }
    let mut expanded = String::with_capacity(rotation.len() + 4);
    expanded.push(chars[1]);
    expanded.push(chars[0]);
    expanded.push(chars[1]);
    expanded.push_str(rotation);
    expanded.push(chars[chars.len() - 2]);
    Some(expanded)
}

/// Sample files in `dir` named `<prefix>*.json`, sorted by name
pub fn discover_input_files(dir: &Path, prefix: &str) -> ImportResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "fp070801050306": 1,
                    "CropRotatn_CY_2021": "CBCBCB",
                    "Management_CY_2021": "123456",
                    "GenLU": "Cropland"
                },
                "geometry": {"type": "Point", "coordinates": [250.5, 4000.0]}
            },
            {
                "type": "Feature",
                "properties": {"fp070801050306": 1, "CropRotatn_CY_2021": "C"},
                "geometry": {"type": "Point", "coordinates": [253.5, 4000.0, 12.0]}
            }
        ]
    }"#;

    #[test]
    fn test_expand_rotation() {
        assert_eq!(expand_rotation("ABCDEF").as_deref(), Some("BABABCDEFE"));
        assert_eq!(expand_rotation("CB").as_deref(), Some("BCBCBC"));
        assert_eq!(expand_rotation("C"), None);
    }

    #[test]
    fn test_reads_points_and_derived_columns() {
        let table = from_geojson_str("sample", SAMPLE).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].position, Some(Position::new(250.5, 4000.0)));
        assert_eq!(table.rows[1].position, Some(Position::new(253.5, 4000.0)));

        let first = &table.rows[0].properties;
        assert_eq!(first["landuse"], "BCBCBCBCBC");
        assert_eq!(first["management"], "2121234565");
        assert!(table.rows[1].properties["landuse"].is_null());
    }

    #[test]
    fn test_irrigated_defaults_to_zero() {
        let table = from_geojson_str("sample", SAMPLE).unwrap();

        assert!(table.has_column("irrigated"));
        assert!(table.rows.iter().all(|r| r.properties["irrigated"] == 0));
    }

    #[test]
    fn test_non_point_geometry_rejected() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": []}}
        ]}"#;
        let err = from_geojson_str("lines", content).unwrap_err();
        assert!(matches!(err, ImportError::InvalidInput { .. }));
    }

    #[test]
    fn test_discover_input_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["smpl3m_b.json", "smpl3m_a.json", "other.json", "smpl3m_c.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = discover_input_files(dir.path(), "smpl3m_").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["smpl3m_a.json", "smpl3m_b.json"]);
    }
}
