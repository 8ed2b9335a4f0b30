//! Test builders: populated stores in temporary directories and ready-made
//! routers.
//!
//! These panic on failure rather than returning `Result`.

use axum::Router;
use rowdesk_core::config::Config;
use rowdesk_core::{Row, TableId};
use rowdesk_store::{JsonStore, SqliteStore, TableStore};
use rowdesk_web::{router, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub fn table(name: &str) -> TableId {
    TableId::parse(name).unwrap_or_else(|e| panic!("bad table name {name:?}: {e}"))
}

// ---------------------------------------------------------------------------
// JsonFixture
// ---------------------------------------------------------------------------

/// A temp directory of JSON snapshots.
///
/// ```rust
/// let fx = JsonFixture::new()
///     .table("DB__Parts.json", scenario_rows())
///     .build();
/// ```
pub struct JsonFixture {
    dir: TempDir,
    tables: Vec<(TableId, Vec<Row>)>,
}

impl JsonFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.tables.push((table(name), rows));
        self
    }

    pub fn build(self) -> BuiltStore {
        let store = JsonStore::new(self.dir.path(), "ID");
        for (id, rows) in &self.tables {
            store.save_all(id, rows).expect("seed snapshot");
        }
        BuiltStore {
            store: Arc::new(store),
            dir: self.dir,
        }
    }
}

/// A populated store and the directory that backs it. Dropping it removes
/// the directory.
pub struct BuiltStore {
    pub store: Arc<dyn TableStore>,
    pub dir: TempDir,
}

impl BuiltStore {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn rows(&self, name: &str) -> Vec<Row> {
        self.store.load_all(&table(name)).expect("load")
    }
}

// ---------------------------------------------------------------------------
// SqliteFixture
// ---------------------------------------------------------------------------

/// A temp directory holding one SQLite database created from `schema`.
pub fn sqlite_fixture(database: &str, schema: &str) -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = rusqlite::Connection::open(dir.path().join(format!("{database}.db"))).expect("open db");
    conn.execute_batch(schema).expect("schema");
    let store = SqliteStore::new(dir.path(), "ID");
    (dir, store)
}

// ---------------------------------------------------------------------------
// Routers
// ---------------------------------------------------------------------------

/// Router over `store` with the default config, `database` as the default
/// database and the given read-only switch.
pub fn app(store: Arc<dyn TableStore>, database: &str, read_only: bool) -> Router {
    router(AppState::new(store, test_config(database, read_only)))
}

pub fn test_config(database: &str, read_only: bool) -> Config {
    let mut config = Config::defaults();
    config.server.read_only = read_only;
    config.store.default_database = database.to_string();
    config.imperial.table = format!("{database}__SetBolts.json");
    config
}

/// Path of the one entry in `dir`, for checking backup folders.
pub fn only_entry(dir: &Path) -> PathBuf {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").path())
        .collect();
    assert_eq!(entries.len(), 1, "expected one entry in {}", dir.display());
    entries.remove(0)
}
