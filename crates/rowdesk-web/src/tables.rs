//! Table routes: list, view, search, CSV download and row edits.

use crate::{blocking, ApiError, SharedState};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use rowdesk_core::export::to_csv_string;
use rowdesk_core::{Row, TableId};
use rowdesk_store::backup::backup_now;
use serde_json::{json, Value};
use std::sync::Arc;

pub(crate) async fn index(State(state): State<SharedState>) -> Json<Value> {
    let store = Arc::clone(&state.store);
    let database = state.config.store.default_database.clone();
    let tables: Vec<String> = match blocking(move || store.list_tables(&database)).await {
        Ok(tables) => tables.iter().map(TableId::file_name).collect(),
        Err(err) => {
            tracing::warn!(error = %err, "listing tables failed");
            Vec::new()
        }
    };
    Json(json!({ "tables": tables, "read_only": state.read_only() }))
}

pub(crate) async fn view(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let rows = state.load(TableId::parse(&file)?).await?;
    let save_url = if state.read_only() {
        String::new()
    } else {
        format!("/save/{file}")
    };
    Ok(Json(json!({
        "table": file,
        "rows": rows,
        "read_only": state.read_only(),
        "save_url": save_url,
    })))
}

pub(crate) async fn search(
    State(state): State<SharedState>,
    Path(file): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let table = TableId::parse(&file)?;
    let rows = state.load(table).await?;
    let query = rowdesk_core::Query::from_params(params);
    let found = query.apply(&rows);
    tracing::debug!(table = %file, total = rows.len(), matched = found.len(), "search");
    Ok(Json(found))
}

pub(crate) async fn csv(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let table = TableId::parse(&file)?;
    let disposition = format!("attachment; filename={}.csv", table.stem());
    let rows = state.load(table).await?;
    let body = to_csv_string(&rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub(crate) async fn save(
    State(state): State<SharedState>,
    Path(file): Path<String>,
    Json(rows): Json<Vec<Row>>,
) -> Result<Redirect, ApiError> {
    state.replace(TableId::parse(&file)?, rows).await?;
    Ok(Redirect::to(&format!("/view/{file}")))
}

pub(crate) async fn add_row(
    State(state): State<SharedState>,
    Path(file): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let table = TableId::parse(&file)?;
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("invalid row: {e}")))?
    };
    if value.is_null() {
        return Err(ApiError::BadRequest("row missing".to_string()));
    }
    let row = Row::from_value(value)
        .ok_or_else(|| ApiError::BadRequest("row must be a JSON object".to_string()))?;

    let store = Arc::clone(&state.store);
    blocking(move || store.insert_one(&table, &row)).await?;
    tracing::info!(table = %file, "row added");
    Ok(Json(json!({ "status": "ok" })))
}

pub(crate) async fn delete_row(
    State(state): State<SharedState>,
    Path((file, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let table = TableId::parse(&file)?;
    let store = Arc::clone(&state.store);
    let key = Value::String(id);
    let deleted = blocking(move || store.delete_one(&table, &key)).await?;
    tracing::info!(table = %file, deleted, "rows deleted");
    Ok(Json(json!({ "status": "ok", "deleted": deleted })))
}

pub(crate) async fn backup(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let config = state.config.backup.clone();
    let path = blocking(move || backup_now(&config)).await?;
    Ok(Json(json!({ "backup": path.display().to_string() })))
}
