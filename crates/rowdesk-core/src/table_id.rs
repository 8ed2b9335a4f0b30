//! Table identifiers.
//!
//! A table is addressed by `(database, table)`. Over HTTP and on disk the pair
//! is spelled as a snapshot filename, `<database>__<table>.json`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEPARATOR: &str = "__";
const EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableIdError {
    #[error("table name {0:?} must look like <database>__<table>.json")]
    MissingSeparator(String),
    #[error("table name {0:?} has an empty database or table part")]
    EmptyPart(String),
    #[error("table name {0:?} contains a path component")]
    UnsafeName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId {
    database: String,
    table: String,
}

impl TableId {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Result<Self, TableIdError> {
        let database = database.into();
        let table = table.into();
        let spelled = format!("{database}{SEPARATOR}{table}");
        if is_unsafe(&database) || is_unsafe(&table) {
            return Err(TableIdError::UnsafeName(spelled));
        }
        if database.is_empty() || table.is_empty() {
            return Err(TableIdError::EmptyPart(spelled));
        }
        Ok(Self { database, table })
    }

    /// Parse `<database>__<table>[.json]`. The split happens at the first `__`,
    /// so table names may themselves contain `__`. Only a `.json` suffix is
    /// dropped; any other dot stays part of the table name.
    pub fn parse(name: &str) -> Result<Self, TableIdError> {
        if is_unsafe(name) {
            return Err(TableIdError::UnsafeName(name.to_string()));
        }
        let (database, rest) = name
            .split_once(SEPARATOR)
            .ok_or_else(|| TableIdError::MissingSeparator(name.to_string()))?;
        let table = rest
            .strip_suffix(EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(rest);
        Self::new(database, table)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `<database>__<table>`
    pub fn stem(&self) -> String {
        format!("{}{SEPARATOR}{}", self.database, self.table)
    }

    /// `<database>__<table>.json`
    pub fn file_name(&self) -> String {
        format!("{}.{EXTENSION}", self.stem())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

impl FromStr for TableId {
    type Err = TableIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_unsafe(part: &str) -> bool {
    part.contains("..") || part.contains('/') || part.contains('\\') || part.contains('\0')
}
