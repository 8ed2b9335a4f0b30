//! CSV export of a row set.
//!
//! The header is the first row's column list. Cells use the same text form as
//! search; null and absent values become empty cells, and columns the first
//! row does not have are dropped.

use crate::types::Row;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Write `rows` as CSV. Nothing at all is written for an empty row set.
pub fn write_csv<W: io::Write>(rows: &[Row], writer: W) -> Result<(), ExportError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let columns: Vec<&str> = first.columns().collect();

    let mut out = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    out.write_record(&columns)?;
    for row in rows {
        out.write_record(
            columns
                .iter()
                .map(|column| row.text(column).unwrap_or_default()),
        )?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_csv_string(rows: &[Row]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
