//! Raw input for the import pipeline

pub mod geojson;
pub mod table;

pub use geojson::{discover_input_files, read_geojson};
pub use table::{RawRow, RawTable, UnitColumns};
