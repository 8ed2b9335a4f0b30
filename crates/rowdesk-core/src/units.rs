//! Millimetre ↔ inch conversion for length columns.

use crate::types::{value_number, Row};
use serde_json::Value;

pub const MM_PER_INCH: f64 = 25.4;

/// Inches, rounded to 4 decimals.
pub fn mm_to_inch(mm: f64) -> f64 {
    round_to(mm / MM_PER_INCH, 4)
}

/// Millimetres, rounded to 3 decimals.
pub fn inch_to_mm(inch: f64) -> f64 {
    round_to(inch * MM_PER_INCH, 3)
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Copy of `row` with `convert` applied to every listed column holding a
/// number. Null and non-numeric values are left as they are.
pub fn convert_columns(row: &Row, columns: &[String], convert: fn(f64) -> f64) -> Row {
    let mut out = row.clone();
    for (name, value) in out.iter_mut() {
        if !columns.iter().any(|c| c == name) {
            continue;
        }
        if let Some(n) = value_number(value) {
            *value = Value::from(convert(n));
        }
    }
    out
}
