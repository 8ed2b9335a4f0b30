//! Imperial view of one configured table.
//!
//! Length columns are stored in millimetres. They are shown in inches, length
//! filters arrive in inches, and edits posted back in inches are converted to
//! millimetres before saving.

use crate::{ApiError, SharedState};
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use rowdesk_core::config::ImperialConfig;
use rowdesk_core::query::{Criterion, Operator, TERM_PARAM};
use rowdesk_core::units::{convert_columns, inch_to_mm, mm_to_inch};
use rowdesk_core::{Row, TableId};
use serde_json::{json, Value};

/// Half a unit in the last place kept by [`inch_to_mm`].
const MM_TOLERANCE: f64 = 0.0005;

pub(crate) async fn browse(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let config = &state.config.imperial;
    let table = TableId::parse(&config.table)?;
    let rows = state.load(table).await?;
    let found = imperial_query(config, &params).apply(&rows);
    Ok(Json(json!({
        "table": config.table,
        "rows": to_inches(config, &found),
        "read_only": state.read_only(),
    })))
}

pub(crate) async fn edit(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let config = &state.config.imperial;
    let rows = state.load(TableId::parse(&config.table)?).await?;
    let save_url = if state.read_only() { "" } else { "/imperial/save" };
    Ok(Json(json!({
        "table": config.table,
        "rows": to_inches(config, &rows),
        "read_only": state.read_only(),
        "save_url": save_url,
    })))
}

pub(crate) async fn save(
    State(state): State<SharedState>,
    Json(rows): Json<Vec<Row>>,
) -> Result<Redirect, ApiError> {
    let config = &state.config.imperial;
    let table = TableId::parse(&config.table)?;
    let rows = rows
        .iter()
        .map(|row| convert_columns(row, &config.length_columns, inch_to_mm))
        .collect();
    state.replace(table, rows).await?;
    Ok(Redirect::to("/imperial/edit"))
}

fn to_inches(config: &ImperialConfig, rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .map(|row| convert_columns(row, &config.length_columns, mm_to_inch))
        .collect()
}

/// Term from `q`, exact matches on the configured text columns, and a length
/// match for each length column given in inches. Other parameters and
/// unparseable lengths are ignored.
fn imperial_query(config: &ImperialConfig, params: &[(String, String)]) -> rowdesk_core::Query {
    let mut query = rowdesk_core::Query::new();
    for (name, value) in params {
        if value.is_empty() {
            continue;
        }
        if name == TERM_PARAM {
            query = query.term(value.as_str());
        } else if config.text_filters.contains(name) {
            query = query.criterion(Criterion::eq(name.as_str(), value.as_str()));
        } else if config.length_columns.contains(name) {
            let Ok(inches) = value.trim().parse::<f64>() else {
                continue;
            };
            let mm = inch_to_mm(inches);
            query = query
                .criterion(Criterion::new(name.as_str(), Operator::Gte, mm - MM_TOLERANCE))
                .criterion(Criterion::new(name.as_str(), Operator::Lte, mm + MM_TOLERANCE));
        }
    }
    query
}
