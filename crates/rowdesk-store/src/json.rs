//! JSON snapshot store.
//!
//! Each table lives in `<dir>/<database>__<table>.json`. A snapshot is either a
//! bare array of row objects or the envelope written by `rowdesk dump`:
//!
//! ```json
//! { "_source_database": "ASTORBASE", "_table_name": "SetBolts", "data": [ ... ] }
//! ```
//!
//! Both shapes are read; the envelope is always written. Each write goes to
//! its own temp file in the store directory, which is then renamed over the
//! snapshot, so readers see either the old rows or the new ones.

use crate::{check_database_name, Result, StoreError, TableStore};
use rowdesk_core::validate::check_row;
use rowdesk_core::{value_text, Row, TableId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "_source_database")]
    source_database: &'a str,
    #[serde(rename = "_table_name")]
    table_name: &'a str,
    data: &'a [Row],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Envelope { data: Vec<Row> },
    Bare(Vec<Row>),
}

pub struct JsonStore {
    dir: PathBuf,
    key_column: String,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>, key_column: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key_column: key_column.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, table: &TableId) -> PathBuf {
        self.dir.join(table.file_name())
    }

    /// Every parseable snapshot name in the directory, sorted. A missing
    /// directory holds no tables.
    fn scan(&self) -> Result<Vec<TableId>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".json") {
                continue;
            }
            if let Ok(id) = TableId::parse(name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl TableStore for JsonStore {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .scan()?
            .into_iter()
            .map(|id| id.database().to_string())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn list_tables(&self, database: &str) -> Result<Vec<TableId>> {
        check_database_name(database)?;
        Ok(self
            .scan()?
            .into_iter()
            .filter(|id| id.database() == database)
            .collect())
    }

    fn load_all(&self, table: &TableId) -> Result<Vec<Row>> {
        let path = self.path(table);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(table.file_name()))
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Snapshot>(&text) {
            Ok(Snapshot::Envelope { data }) | Ok(Snapshot::Bare(data)) => Ok(data),
            Err(e) => Err(StoreError::Malformed {
                path,
                message: format!("expected an array of row objects or a snapshot envelope ({e})"),
            }),
        }
    }

    fn save_all(&self, table: &TableId, rows: &[Row]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let envelope = Envelope {
            source_database: table.database(),
            table_name: table.table(),
            data: rows,
        };
        let path = self.path(table);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(&envelope)?)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        tracing::debug!(table = %table, rows = rows.len(), "snapshot written");
        Ok(())
    }

    fn insert_one(&self, table: &TableId, row: &Row) -> Result<()> {
        let mut rows = self.load_all(table)?;
        if let Some(first) = rows.first() {
            check_row(rows.len(), row, &first.key_set())?;
        }
        rows.push(row.clone());
        self.save_all(table, &rows)
    }

    fn delete_one(&self, table: &TableId, key: &Value) -> Result<usize> {
        let Some(key) = value_text(key) else {
            return Ok(0);
        };
        let mut rows = self.load_all(table)?;
        let before = rows.len();
        rows.retain(|row| row.text(&self.key_column).as_deref() != Some(key.as_str()));
        let removed = before - rows.len();
        if removed > 0 {
            self.save_all(table, &rows)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn table() -> TableId {
        TableId::parse("DB__Parts.json").unwrap()
    }

    fn store(dir: &Path) -> JsonStore {
        JsonStore::new(dir, "ID")
    }

    #[test]
    fn reads_bare_arrays_and_envelopes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DB__Parts.json"), r#"[{"ID":1,"Name":"Bolt"}]"#).unwrap();
        std::fs::write(
            dir.path().join("DB__Nuts.json"),
            r#"{"_source_database":"DB","_table_name":"Nuts","data":[{"ID":7}]}"#,
        )
        .unwrap();
        let store = store(dir.path());
        assert_eq!(store.load_all(&table()).unwrap(), vec![Row::new().with("ID", 1).with("Name", "Bolt")]);
        let nuts = TableId::parse("DB__Nuts.json").unwrap();
        assert_eq!(store.load_all(&nuts).unwrap(), vec![Row::new().with("ID", 7)]);
    }

    #[test]
    fn writes_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save_all(&table(), &[Row::new().with("ID", 1)]).unwrap();
        let raw: Value = serde_json::from_slice(&std::fs::read(store.path(&table())).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({"_source_database": "DB", "_table_name": "Parts", "data": [{"ID": 1}]})
        );
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn concurrent_saves_to_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store(dir.path()));
        let rows: Vec<Row> = (0..2000).map(|i| Row::new().with("ID", i)).collect();
        store.save_all(&table(), &rows).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                let rows = rows.clone();
                std::thread::spawn(move || {
                    let mut errors = Vec::new();
                    for _ in 0..50 {
                        if let Err(e) = store.save_all(&table(), &rows) {
                            errors.push(e.to_string());
                        }
                        match store.load_all(&table()) {
                            Ok(loaded) => assert_eq!(loaded.len(), rows.len()),
                            Err(e) => errors.push(e.to_string()),
                        }
                    }
                    errors
                })
            })
            .collect();

        let errors: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(store.list_tables("DB").unwrap(), vec![table()]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).load_all(&table()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(name) if name == "DB__Parts.json"));
    }

    #[test]
    fn malformed_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DB__Parts.json"), r#"{"rows": 3}"#).unwrap();
        let err = store(dir.path()).load_all(&table()).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn lists_tables_per_database() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["DB__B.json", "DB__A.json", "OTHER__C.json", "notes.txt", "loose.json"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }
        let store = store(dir.path());
        let tables: Vec<String> = store
            .list_tables("DB")
            .unwrap()
            .iter()
            .map(TableId::file_name)
            .collect();
        assert_eq!(tables, vec!["DB__A.json", "DB__B.json"]);
        assert_eq!(store.list_databases().unwrap(), vec!["DB", "OTHER"]);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("absent"));
        assert!(store.list_tables("DB").unwrap().is_empty());
    }

    #[test]
    fn insert_checks_existing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save_all(&table(), &[Row::new().with("ID", 1).with("Name", "Bolt")]).unwrap();

        let err = store.insert_one(&table(), &Row::new().with("ID", 2)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        store
            .insert_one(&table(), &Row::new().with("ID", 2).with("Name", "Nut"))
            .unwrap();
        assert_eq!(store.load_all(&table()).unwrap().len(), 2);
    }

    #[test]
    fn delete_matches_key_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let rows = vec![Row::new().with("ID", 1), Row::new().with("ID", 2)];
        store.save_all(&table(), &rows).unwrap();

        assert_eq!(store.delete_one(&table(), &json!("2")).unwrap(), 1);
        assert_eq!(store.delete_one(&table(), &json!(9)).unwrap(), 0);
        assert_eq!(store.load_all(&table()).unwrap(), vec![Row::new().with("ID", 1)]);
    }

    #[test]
    fn replace_all_validates_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let bad = vec![Row::new().with("ID", 1), Row::new().with("Name", "x")];
        assert!(matches!(store.replace_all(&table(), &bad), Err(StoreError::Validation(_))));
        assert!(!store.path(&table()).exists());
    }

    #[test]
    fn sql_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).execute("DB", "SELECT 1").unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { store: "json", .. }));
    }
}
