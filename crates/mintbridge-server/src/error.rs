//! HTTP error type

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mintbridge_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by request handlers and the server loop
#[derive(Debug, Error)]
pub enum ServerError {
    /// Domain failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Body could not be read as the expected JSON
    #[error("{0}")]
    BadRequest(String),

    /// Listener or serve loop failure
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for handlers
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Core(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text for the `error` field; client errors carry their bare message
    pub fn message(&self) -> String {
        match self {
            ServerError::Core(CoreError::Validation(m))
            | ServerError::Core(CoreError::PreconditionConflict(m)) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
