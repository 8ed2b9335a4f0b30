//! rowdesk-store — table store adapters for rowdesk.
//!
//! A store loads and saves the complete row set of one table at a time. It
//! knows nothing about searching or filtering; rows go to
//! [`rowdesk_core::query`] after loading. Two adapters exist and are
//! interchangeable behind [`TableStore`]:
//!
//! - [`JsonStore`]: a directory of `<database>__<table>.json` snapshots.
//! - [`SqliteStore`]: a directory of `<database>.db` SQLite files.

pub mod backup;
pub mod json;
pub mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

use rowdesk_core::config::{StoreBackend, StoreConfig};
use rowdesk_core::{validate, Row, TableId, TableIdError, ValidationError};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Store error types covering every adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The table, database or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidTableId(#[from] TableIdError),

    #[error("invalid database name {0:?}")]
    InvalidDatabase(String),

    /// Rows rejected before anything was written.
    #[error("invalid rows: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} is not supported by the {store} store")]
    Unsupported {
        operation: &'static str,
        store: &'static str,
    },

    /// A snapshot file exists but is not a row array or snapshot envelope.
    #[error("malformed snapshot {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Source and sink of full row sets.
///
/// Implementations are synchronous and hold no open handles between calls, so
/// a store can be shared across request handlers without locking. Concurrent
/// writers to one table are not coordinated: the last write wins.
pub trait TableStore: Send + Sync {
    /// Short adapter name for messages (`"json"`, `"sqlite"`).
    fn kind(&self) -> &'static str;

    fn list_databases(&self) -> Result<Vec<String>>;

    fn list_tables(&self, database: &str) -> Result<Vec<TableId>>;

    fn load_all(&self, table: &TableId) -> Result<Vec<Row>>;

    /// Replace the table contents with `rows`. Callers normally go through
    /// [`replace_all`](Self::replace_all), which validates first.
    fn save_all(&self, table: &TableId, rows: &[Row]) -> Result<()>;

    fn insert_one(&self, table: &TableId, row: &Row) -> Result<()>;

    /// Remove every row whose key column equals `key`; returns how many went.
    fn delete_one(&self, table: &TableId, key: &Value) -> Result<usize>;

    /// Run an ad-hoc SQL statement. Statements that produce no result
    /// columns return an empty row set.
    fn execute(&self, _database: &str, _sql: &str) -> Result<Vec<Row>> {
        Err(StoreError::Unsupported {
            operation: "SQL",
            store: self.kind(),
        })
    }

    /// Like [`execute`](Self::execute), but on a connection that refuses
    /// writes, so `UPDATE`, `DELETE` and DDL fail instead of running.
    fn query(&self, _database: &str, _sql: &str) -> Result<Vec<Row>> {
        Err(StoreError::Unsupported {
            operation: "SQL",
            store: self.kind(),
        })
    }

    /// Validate `rows` for a consistent column set, then [`save_all`](Self::save_all).
    fn replace_all(&self, table: &TableId, rows: &[Row]) -> Result<()> {
        validate(rows, None)?;
        self.save_all(table, rows)
    }
}

/// Build the store selected by `config.backend`.
pub fn open_store(config: &StoreConfig) -> Arc<dyn TableStore> {
    match config.backend {
        StoreBackend::Json => Arc::new(JsonStore::new(&config.data_dir, &config.key_column)),
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(&config.sqlite_dir, &config.key_column)),
    }
}

/// Reject database names that could escape the store directory.
pub(crate) fn check_database_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(StoreError::InvalidDatabase(name.to_string()));
    }
    Ok(())
}
