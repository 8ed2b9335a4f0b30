//! Static row sets used across harnesses.

use rowdesk_core::Row;
use serde_json::Value;

/// Three fasteners; the `size` column is textual (`M10`, `M12`).
pub fn scenario_rows() -> Vec<Row> {
    vec![
        Row::new().with("id", 1).with("name", "Bolt").with("size", "M10"),
        Row::new().with("id", 2).with("name", "Nut").with("size", "M12"),
        Row::new().with("id", 3).with("name", "Washer").with("size", "M10"),
    ]
}

/// Bolt sets with lengths in millimetres, shaped like the imperial table.
pub fn set_bolts() -> Vec<Row> {
    vec![
        Row::new()
            .with("ID", 1)
            .with("Name", "Hex bolt")
            .with("Standard", "ISO 4014")
            .with("Material", "Steel")
            .with("Type", "HS")
            .with("BoltDefID", 10)
            .with("Diameter", 12.7)
            .with("Length", 50.8)
            .with("HeadHeight", Value::Null),
        Row::new()
            .with("ID", 2)
            .with("Name", "Hex bolt")
            .with("Standard", "DIN 931")
            .with("Material", "Stainless")
            .with("Type", "HS")
            .with("BoltDefID", 11)
            .with("Diameter", 25.4)
            .with("Length", 76.2)
            .with("HeadHeight", 15.875),
        Row::new()
            .with("ID", 3)
            .with("Name", "Stud")
            .with("Standard", "ISO 4014")
            .with("Material", "Steel")
            .with("Type", "TS")
            .with("BoltDefID", 99)
            .with("Diameter", 12.7)
            .with("Length", 101.6)
            .with("HeadHeight", Value::Null),
    ]
}

/// Parents for [`set_bolts`]; `BoltDefID` 99 has no definition.
pub fn bolt_definitions() -> Vec<Row> {
    vec![
        Row::new().with("ID", 10).with("Grade", "8.8"),
        Row::new().with("ID", 11).with("Grade", "A2-70"),
    ]
}

/// Column names for generated rows.
pub const COLUMNS: &[&str] = &["id", "name", "size", "grade"];
