//! Typed errors and HTTP mapping.

use crate::service::Violations;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("backend client: {0}")]
    Client(String),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// What went wrong on the storage side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// A unique constraint rejected the write (SQLSTATE 23505).
    UniqueViolation,
    /// The backend understood the request and refused it.
    Query,
    /// The request never got a proper answer (network, pool, decoding).
    Transport,
}

/// Error returned by every `Backend` call. `message` is the backend's own text.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        BackendError {
            kind,
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Query, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transport, message)
    }

    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::UniqueViolation, message)
    }

    pub fn is_unique_violation(&self) -> bool {
        self.kind == BackendErrorKind::UniqueViolation
    }
}

/// The error code returned by Postgres for a unique constraint violation.
pub(crate) const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for BackendError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(inner) => {
                let kind = if inner.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                    BackendErrorKind::UniqueViolation
                } else {
                    BackendErrorKind::Query
                };
                BackendError::new(kind, inner.message())
            }
            _ => BackendError::transport(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::transport(e.to_string())
    }
}

/// Failure of one step of a serverless-function call sequence.
#[derive(Error, Debug)]
#[error("function {function} failed: {message}")]
pub struct FunctionError {
    pub function: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("Données invalides")]
    Validation(Violations),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "backend_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        if let AppError::Backend(e) = &self {
            tracing::error!(kind = ?e.kind, error = %e, "backend request failed");
        }
        let details = match &self {
            AppError::Validation(v) => serde_json::to_value(v).ok(),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            code,
            details,
        };
        (status, Json(body)).into_response()
    }
}
