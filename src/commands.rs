//! Command implementations behind the `rowdesk` subcommands.
//!
//! Each command takes its store explicitly and returns what it would print,
//! so integration tests can run them against temporary directories. SQL,
//! `check` and `dump` always go through SQLite; the other commands use
//! whichever store the config selects.

use anyhow::{bail, Context};
use rowdesk_core::export::write_csv;
use rowdesk_core::integrity::{orphans, ColumnRef};
use rowdesk_core::render::format_table;
use rowdesk_core::{Row, TableId};
use rowdesk_store::{JsonStore, SqliteStore, TableStore};
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// How `rowdesk sql` prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

// ---------------------------------------------------------------------------
// export-csv
// ---------------------------------------------------------------------------

/// Write one table to `output` as CSV. Returns the number of rows written.
pub fn export_csv(
    store: &dyn TableStore,
    database: &str,
    table: &str,
    output: &Path,
) -> anyhow::Result<usize> {
    let table = TableId::new(database, table)?;
    let rows = store.load_all(&table)?;
    let file = File::create(output)
        .with_context(|| format!("cannot create {}", output.display()))?;
    write_csv(&rows, BufWriter::new(file))?;
    tracing::info!(table = %table, rows = rows.len(), path = %output.display(), "exported");
    Ok(rows.len())
}

// ---------------------------------------------------------------------------
// sql / check
// ---------------------------------------------------------------------------

pub fn run_sql(
    store: &SqliteStore,
    database: &str,
    sql: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let rows = store.execute(database, sql)?;
    Ok(match format {
        OutputFormat::Table => format_table(&rows),
        OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
    })
}

/// Confirm the database opens and answers a trivial query.
pub fn check(store: &SqliteStore, database: &str) -> anyhow::Result<()> {
    store
        .execute(database, "SELECT 1")
        .with_context(|| format!("database {database} is not reachable"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// dump
// ---------------------------------------------------------------------------

/// Outcome of [`dump`]: tables written and tables that failed with why.
#[derive(Debug, Default)]
pub struct DumpReport {
    pub written: Vec<TableId>,
    pub failed: Vec<(TableId, String)>,
}

/// Copy every table of every SQLite database into JSON snapshots. A table
/// that fails is recorded and skipped.
pub fn dump(source: &SqliteStore, target: &JsonStore) -> anyhow::Result<DumpReport> {
    let mut report = DumpReport::default();
    for database in source.list_databases()? {
        for table in source.list_tables(&database)? {
            match source.load_all(&table).and_then(|rows| target.save_all(&table, &rows)) {
                Ok(()) => {
                    tracing::info!(table = %table, "dumped");
                    report.written.push(table);
                }
                Err(err) => {
                    tracing::warn!(table = %table, error = %err, "dump failed");
                    report.failed.push((table, err.to_string()));
                }
            }
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// integrity
// ---------------------------------------------------------------------------

/// Child values in `child` with no matching value in `parent`.
pub fn integrity(
    store: &dyn TableStore,
    database: &str,
    child: &ColumnRef,
    parent: &ColumnRef,
) -> anyhow::Result<Vec<Value>> {
    let load = |column: &ColumnRef| -> anyhow::Result<Vec<Row>> {
        let table = TableId::new(database, column.table.as_str())?;
        Ok(store.load_all(&table)?)
    };
    let parent_rows = load(parent)?;
    let child_rows = load(child)?;
    if let Some(first) = child_rows.first() {
        if first.get(&child.column).is_none() {
            bail!("column {child} not found");
        }
    }
    Ok(orphans(&parent_rows, &parent.column, &child_rows, &child.column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sqlite_fixture() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let conn = rusqlite::Connection::open(dir.path().join("DB.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE Parts (ID INTEGER, Name TEXT);
             INSERT INTO Parts VALUES (1, 'Bolt'), (2, 'Nut');",
        )
        .unwrap();
        let store = SqliteStore::new(dir.path(), "ID");
        (dir, store)
    }

    #[test]
    fn sql_renders_table_and_json() {
        let (_dir, store) = sqlite_fixture();
        let text = run_sql(&store, "DB", "SELECT ID, Name FROM Parts", OutputFormat::Table).unwrap();
        assert_eq!(text, "ID | Name\n---+-----\n1  | Bolt\n2  | Nut");

        let text = run_sql(&store, "DB", "SELECT Name FROM Parts WHERE ID = 2", OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{"Name": "Nut"}]));
    }

    #[test]
    fn check_reports_missing_database() {
        let (_dir, store) = sqlite_fixture();
        assert!(check(&store, "DB").is_ok());
        let err = check(&store, "Nope").unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn dump_writes_envelopes() {
        let (dir, source) = sqlite_fixture();
        let target = JsonStore::new(dir.path().join("dump"), "ID");
        let report = dump(&source, &target).unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(report.failed.is_empty());

        let raw: Value = serde_json::from_slice(
            &std::fs::read(dir.path().join("dump").join("DB__Parts.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["_source_database"], "DB");
        assert_eq!(raw["_table_name"], "Parts");
        assert_eq!(raw["data"][1], json!({"ID": 2, "Name": "Nut"}));
    }

    #[test]
    fn export_writes_file() {
        let (dir, store) = sqlite_fixture();
        let out = dir.path().join("parts.csv");
        assert_eq!(export_csv(&store, "DB", "Parts", &out).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(out).unwrap(), "ID,Name\n1,Bolt\n2,Nut\n");
    }

    #[test]
    fn integrity_lists_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "ID");
        let parents = TableId::new("DB", "BoltDefinition").unwrap();
        let children = TableId::new("DB", "SetBolts").unwrap();
        store.save_all(&parents, &[Row::new().with("ID", 1)]).unwrap();
        store
            .save_all(
                &children,
                &[Row::new().with("BoltDefID", 1), Row::new().with("BoltDefID", 4)],
            )
            .unwrap();

        let child: ColumnRef = "SetBolts.BoltDefID".parse().unwrap();
        let parent: ColumnRef = "BoltDefinition.ID".parse().unwrap();
        assert_eq!(integrity(&store, "DB", &child, &parent).unwrap(), vec![json!(4)]);

        let bogus: ColumnRef = "SetBolts.Nope".parse().unwrap();
        assert!(integrity(&store, "DB", &bogus, &parent).is_err());
    }
}
