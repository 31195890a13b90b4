//! Error types shared across the index binaries.
//!
//! `IndexError` is the domain error surfaced by stores and services;
//! `AppError` adapts it to an HTTP response for the query API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Domain errors of the index.
///
/// Writers surface these to the event boundary so the delivery runtime can
/// redeliver; readers map them onto HTTP statuses via [`AppError`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// Caller supplied an unusable argument (empty bucket/name, unknown
    /// event type, malformed payload).
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The referenced record does not exist. For events this is treated
    /// as transient: the missing record may arrive via redelivery.
    #[error("not found: {0}")]
    NotFound(String),

    /// A duplicate insert hit a primary-key constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend I/O failure.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Unrecoverable condition; the process should exit.
    #[error("fatal: {0}")]
    Fatal(String),
}

/// A lightweight wrapper for HTTP errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Validation(msg) => AppError::new(StatusCode::BAD_REQUEST, msg),
            IndexError::NotFound(msg) => AppError::new(StatusCode::NOT_FOUND, msg),
            IndexError::Conflict(msg) => AppError::new(StatusCode::CONFLICT, msg),
            IndexError::Store(err) => AppError::internal(err.to_string()),
            IndexError::Fatal(msg) => AppError::internal(msg),
        }
    }
}
