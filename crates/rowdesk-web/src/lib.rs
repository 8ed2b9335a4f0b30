//! rowdesk-web — JSON HTTP façade over a [`TableStore`].
//!
//! Every handler loads rows through the store on the blocking pool, hands them
//! to the core query engine or validator, and serializes the result. Write
//! routes are only registered when `server.read_only` is false, so a
//! read-only server answers them with 404.

mod error;
mod imperial;
mod sql;
mod tables;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use rowdesk_core::config::Config;
use rowdesk_core::{Row, TableId};
use rowdesk_store::{StoreError, TableStore};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared by every handler.
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub config: Config,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, config: Config) -> Self {
        Self { store, config }
    }

    fn read_only(&self) -> bool {
        self.config.server.read_only
    }

    async fn load(&self, table: TableId) -> Result<Vec<Row>, ApiError> {
        let store = Arc::clone(&self.store);
        blocking(move || store.load_all(&table)).await
    }

    async fn replace(&self, table: TableId, rows: Vec<Row>) -> Result<(), ApiError> {
        let store = Arc::clone(&self.store);
        let count = rows.len();
        blocking(move || store.replace_all(&table, &rows)).await?;
        tracing::info!(rows = count, "table saved");
        Ok(())
    }
}

/// Run a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

pub fn router(state: AppState) -> Router {
    let read_only = state.read_only();
    let mut app = Router::new()
        .route("/", get(tables::index))
        .route("/view/{file}", get(tables::view))
        .route("/search/{file}", get(tables::search))
        .route("/csv/{file}", get(tables::csv))
        .route("/imperial", get(imperial::browse))
        .route("/imperial/edit", get(imperial::edit))
        .route("/sql", get(sql::list_tables))
        .route("/sql/{table}", get(sql::query_form).post(sql::run_query));

    if !read_only {
        app = app
            .route("/save/{file}", post(tables::save))
            .route("/add_row/{file}", post(tables::add_row))
            .route("/delete_row/{file}/{id}", post(tables::delete_row))
            .route("/backup", get(tables::backup))
            .route("/imperial/save", post(imperial::save));
    }

    app.layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `config.server.bind` and serve until Ctrl-C.
pub async fn serve(config: Config, store: Arc<dyn TableStore>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        store = store.kind(),
        read_only = config.server.read_only,
        "rowdesk listening"
    );
    axum::serve(listener, router(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rowdesk_store::JsonStore;
    use tower::ServiceExt;

    fn app(dir: &std::path::Path, read_only: bool) -> Router {
        let mut config = Config::defaults();
        config.server.read_only = read_only;
        router(AppState::new(Arc::new(JsonStore::new(dir, "ID")), config))
    }

    async fn status(app: Router, method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("[]"))
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn read_only_hides_write_routes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DB__T.json"), "[]").unwrap();
        assert_eq!(status(app(dir.path(), true), "POST", "/save/DB__T.json").await, StatusCode::NOT_FOUND);
        assert_eq!(status(app(dir.path(), true), "GET", "/backup").await, StatusCode::NOT_FOUND);
        assert_eq!(status(app(dir.path(), false), "POST", "/save/DB__T.json").await, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn unsafe_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            status(app(dir.path(), true), "GET", "/view/..__secret.json").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(app(dir.path(), true), "GET", "/view/nothing.json").await,
            StatusCode::BAD_REQUEST
        );
    }
}
