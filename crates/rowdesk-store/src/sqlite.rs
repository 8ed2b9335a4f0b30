//! SQLite store.
//!
//! Each database is `<dir>/<database>.db`; tables are the tables inside it.
//! Connections are opened per call and dropped on return. The schema belongs
//! to the database file: this store never creates or alters tables, so row
//! shape on insert is checked by SQLite itself.

use crate::{check_database_name, Result, StoreError, TableStore};
use rowdesk_core::{Row, TableId};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Statement};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const EXTENSION: &str = "db";

pub struct SqliteStore {
    dir: PathBuf,
    key_column: String,
}

impl SqliteStore {
    pub fn new(dir: impl Into<PathBuf>, key_column: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key_column: key_column.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, database: &str) -> PathBuf {
        self.dir.join(format!("{database}.{EXTENSION}"))
    }

    /// Open an existing database file. Never creates one.
    fn open(&self, database: &str) -> Result<Connection> {
        self.open_with(database, OpenFlags::default())
    }

    fn open_with(&self, database: &str, flags: OpenFlags) -> Result<Connection> {
        check_database_name(database)?;
        let path = self.path(database);
        if !path.is_file() {
            return Err(StoreError::NotFound(format!("{database}.{EXTENSION}")));
        }
        let conn = Connection::open_with_flags(&path, flags)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Open the table's database and confirm the table exists.
    fn open_table(&self, table: &TableId) -> Result<Connection> {
        let conn = self.open(table.database())?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![table.table()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::NotFound(table.to_string()));
        }
        Ok(conn)
    }
}

impl TableStore for SqliteStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_tables(&self, database: &str) -> Result<Vec<TableId>> {
        let conn = self.open(database)?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names
            .into_iter()
            .filter_map(|name| TableId::new(database, name).ok())
            .collect())
    }

    fn load_all(&self, table: &TableId) -> Result<Vec<Row>> {
        let conn = self.open_table(table)?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote(table.table())))?;
        collect_rows(&mut stmt)
    }

    fn save_all(&self, table: &TableId, rows: &[Row]) -> Result<()> {
        let mut conn = self.open_table(table)?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", quote(table.table())), [])?;
        for row in rows {
            insert_row(&tx, table.table(), row)?;
        }
        tx.commit()?;
        tracing::debug!(table = %table, rows = rows.len(), "table replaced");
        Ok(())
    }

    fn insert_one(&self, table: &TableId, row: &Row) -> Result<()> {
        let conn = self.open_table(table)?;
        insert_row(&conn, table.table(), row)
    }

    fn delete_one(&self, table: &TableId, key: &Value) -> Result<usize> {
        let conn = self.open_table(table)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(table.table()),
            quote(&self.key_column)
        );
        Ok(conn.execute(&sql, [to_sql(key)])?)
    }

    fn execute(&self, database: &str, sql: &str) -> Result<Vec<Row>> {
        let conn = self.open(database)?;
        let mut stmt = conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            let changed = stmt.execute([])?;
            tracing::debug!(database, changed, "statement executed");
            return Ok(Vec::new());
        }
        collect_rows(&mut stmt)
    }

    fn query(&self, database: &str, sql: &str) -> Result<Vec<Row>> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = self.open_with(database, flags)?;
        let mut stmt = conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            stmt.execute([])?;
            return Ok(Vec::new());
        }
        collect_rows(&mut stmt)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn insert_row(conn: &Connection, table: &str, row: &Row) -> Result<()> {
    if row.is_empty() {
        conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", quote(table)), [])?;
        return Ok(());
    }
    let columns: Vec<String> = row.columns().map(quote).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(row.values().map(to_sql)))?;
    Ok(())
}

fn collect_rows(stmt: &mut Statement<'_>) -> Result<Vec<Row>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, name) in names.iter().enumerate() {
            record.insert(name.as_str(), from_sql(row.get_ref(i)?));
        }
        out.push(record);
    }
    Ok(out)
}

/// JSON cell to SQLite value. Booleans become 0/1; arrays and objects are
/// stored as their JSON text.
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// SQLite value to JSON cell. Blobs become lower-case hex text.
fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}
