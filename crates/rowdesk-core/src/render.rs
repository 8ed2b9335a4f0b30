//! Plain-text table rendering for the SQL console.

use crate::types::{value_text, Row};

const EMPTY: &str = "No results.";
const NULL: &str = "NULL";

/// Render rows as an aligned text table: header, `-+-` rule, one line per
/// row. Columns come from the first row. Trailing padding is trimmed.
pub fn format_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return EMPTY.to_string();
    };
    let columns: Vec<&str> = first.columns().collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).and_then(value_text).unwrap_or_else(|| NULL.to_string()))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join_padded(columns.iter().copied(), &widths, " | "));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for line in &cells {
        lines.push(join_padded(line.iter().map(String::as_str), &widths, " | "));
    }
    lines.join("\n")
}

fn join_padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], sep: &str) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join(sep).trim_end().to_string()
}
