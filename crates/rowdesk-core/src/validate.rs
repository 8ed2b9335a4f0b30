//! Row validation — every row of a batch must have the same column set.
//!
//! Run before any write reaches a store. The reference column set is either
//! supplied by the caller or taken from the first row. The first row that
//! deviates fails the whole batch.

use crate::types::{KeySet, Row};
use thiserror::Error;

/// A row whose column set differs from the reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.missing, .extra))]
pub struct ValidationError {
    /// Position of the offending row in the batch.
    pub row: usize,
    /// Reference columns absent from the row, sorted.
    pub missing: Vec<String>,
    /// Row columns absent from the reference, sorted.
    pub extra: Vec<String>,
}

fn describe(missing: &[String], extra: &[String]) -> String {
    let mut clauses = Vec::with_capacity(2);
    if !missing.is_empty() {
        clauses.push(format!("missing keys: {missing:?}"));
    }
    if !extra.is_empty() {
        clauses.push(format!("extra keys: {extra:?}"));
    }
    clauses.join("; ")
}

/// Check that every row in `rows` has exactly the `reference` columns, or the
/// first row's columns when no reference is given. An empty batch is valid.
pub fn validate(rows: &[Row], reference: Option<&KeySet>) -> Result<(), ValidationError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let derived;
    let keys = match reference {
        Some(keys) => keys,
        None => {
            derived = first.key_set();
            &derived
        }
    };
    rows.iter()
        .enumerate()
        .try_for_each(|(index, row)| check_row(index, row, keys))
}

/// Check a single row against a column set.
pub fn check_row(index: usize, row: &Row, keys: &KeySet) -> Result<(), ValidationError> {
    let have = row.key_set();
    if &have == keys {
        return Ok(());
    }
    Err(ValidationError {
        row: index,
        missing: keys.difference(&have).cloned().collect(),
        extra: have.difference(keys).cloned().collect(),
    })
}
