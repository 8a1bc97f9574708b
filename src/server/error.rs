//! HTTP mapping for [`DocumentError`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::DocumentError;

/// JSON error body: `{"error": "NOT_FOUND", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Request-level failure rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub DocumentError);

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        match &err {
            DocumentError::Forbidden { path } => {
                tracing::warn!("[server] rejected path outside root: {path:?}");
            }
            DocumentError::NotFound { .. } => {
                crate::debug_event!("server", "not found", "{err}");
            }
            DocumentError::Discovery { .. } => {
                tracing::error!("[server] {err}");
            }
        }

        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: err.code(),
            message: err.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
