//! Ad-hoc SQL against the default database.
//!
//! Failures are reported inside the JSON payload rather than as error
//! statuses, so a client can show the message next to the query it sent.
//! A read-only server runs statements on a read-only connection.

use crate::{blocking, SharedState};
use axum::extract::{Path, State};
use axum::Json;
use rowdesk_core::TableId;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const PREVIEW_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub(crate) struct SqlForm {
    query: String,
}

pub(crate) async fn list_tables(State(state): State<SharedState>) -> Json<Value> {
    let store = Arc::clone(&state.store);
    let database = state.config.store.default_database.clone();
    match blocking(move || store.list_tables(&database)).await {
        Ok(tables) => {
            let names: Vec<&str> = tables.iter().map(TableId::table).collect();
            Json(json!({ "tables": names, "error": null }))
        }
        Err(err) => Json(json!({ "tables": [], "error": err.to_string() })),
    }
}

pub(crate) async fn query_form(Path(table): Path<String>) -> Json<Value> {
    Json(json!({
        "table": table,
        "query": preview_query(&table),
        "results": null,
        "error": null,
    }))
}

pub(crate) async fn run_query(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Json(form): Json<SqlForm>,
) -> Json<Value> {
    let store = Arc::clone(&state.store);
    let database = state.config.store.default_database.clone();
    let sql = form.query.clone();
    let read_only = state.read_only();
    let outcome = blocking(move || {
        if read_only {
            store.query(&database, &sql)
        } else {
            store.execute(&database, &sql)
        }
    })
    .await;
    let (results, error) = match outcome {
        Ok(rows) => {
            tracing::debug!(rows = rows.len(), "query executed");
            (json!(rows), Value::Null)
        }
        Err(err) => {
            tracing::debug!(error = %err, "query failed");
            (Value::Null, json!(err.to_string()))
        }
    };
    Json(json!({
        "table": table,
        "query": form.query,
        "results": results,
        "error": error,
    }))
}

fn preview_query(table: &str) -> String {
    format!(
        "SELECT * FROM \"{}\" LIMIT {PREVIEW_LIMIT}",
        table.replace('"', "\"\"")
    )
}
