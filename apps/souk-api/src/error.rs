//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use souk_sync::{LifecycleError, SyncError};
use thiserror::Error;
use tracing::error;

/// API-level error, mapped to an HTTP status and JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Lifecycle(LifecycleError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            Self::Lifecycle(LifecycleError::NotFound) => StatusCode::NOT_FOUND,
            Self::Lifecycle(LifecycleError::Provider(_)) | Self::Sync(SyncError::Provider(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Lifecycle(LifecycleError::Store(_)) | Self::Sync(SyncError::Store(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
