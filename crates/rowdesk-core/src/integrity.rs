//! Referential integrity check between two tables.
//!
//! There are no foreign keys in the stored data, so dangling references are
//! found by comparing the text forms of a child column against a parent
//! column.

use crate::types::{value_text, Row};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `Table.Column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column reference {0:?} must look like <table>.<column>")]
pub struct ColumnRefError(String);

impl FromStr for ColumnRef {
    type Err = ColumnRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok(Self {
                table: table.to_string(),
                column: column.to_string(),
            }),
            _ => Err(ColumnRefError(s.to_string())),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Child values with no matching parent value, in child order. Null child
/// values are not references and are skipped.
pub fn orphans(parent_rows: &[Row], parent_column: &str, child_rows: &[Row], child_column: &str) -> Vec<Value> {
    let known: HashSet<String> = parent_rows
        .iter()
        .filter_map(|row| row.text(parent_column))
        .collect();
    child_rows
        .iter()
        .filter_map(|row| row.get(child_column))
        .filter(|value| value_text(value).is_some_and(|text| !known.contains(&text)))
        .cloned()
        .collect()
}
