//! Error types for the mock API transport.
//!
//! [`ServerError`] unifies all request failure modes into a single enum
//! that converts into a JSON HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": <message>, "status": <code>}`.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mimic_core::repository::RepositoryError;
use tracing::error;

/// Message returned for every 500 response. Details go to the log only.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No route or record matches the request.
    #[error("not found: {0}")]
    NotFound(String),

    /// A CRUD request body is not a JSON object.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// An unexpected failure inside a handler.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServerError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound { .. } => Self::NotFound(e.to_string()),
            RepositoryError::UnknownCollection(_) | RepositoryError::InvalidCollection(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidBody(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Turn a handler panic into the generic 500 response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    ServerError::Internal(format!("handler panicked: {detail}")).into_response()
}
