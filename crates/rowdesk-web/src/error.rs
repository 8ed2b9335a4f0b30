//! Handler errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rowdesk_core::export::ExportError;
use rowdesk_core::TableIdError;
use rowdesk_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("CSV export failed: {0}")]
    Export(#[from] ExportError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<TableIdError> for ApiError {
    fn from(err: TableIdError) -> Self {
        Self::Store(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(err) => match err {
                StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::InvalidTableId(_) | StoreError::InvalidDatabase(_) => {
                    StatusCode::BAD_REQUEST
                }
                StoreError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
                StoreError::Malformed { .. }
                | StoreError::Io(_)
                | StoreError::Json(_)
                | StoreError::Sql(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
