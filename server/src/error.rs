//! Error types for the StagePass server.
//!
//! This module defines the error taxonomy surfaced at the HTTP boundary:
//!
//! - [`ApiError`] - Request-handling errors, mapped to status codes by its
//!   `IntoResponse` implementation
//! - [`ErrorResponse`] - The JSON body shape shared by every error response
//!
//! Store errors are classified here rather than in handlers: a missing row
//! becomes 404, a foreign-key violation becomes 409, and anything else is
//! logged and returned as an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub error: String,

    /// Machine-readable error tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Errors that can occur while handling a request.
///
/// # Error Categories
///
/// - **Unauthorized**: missing/invalid/expired token, or bad login credentials
/// - **NotFound**: get/update/delete against an id that does not exist
/// - **Conflict**: foreign-key violation, or a delete rejected by policy
/// - **Database**: any other store failure, classified in `into_response`
/// - **Internal**: unexpected failures that fit no other category
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failure.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying store error.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Unexpected internal server error.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a new authentication error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stagepass_server::error::ApiError;
    ///
    /// let err = ApiError::unauthorized("invalid token");
    /// assert!(matches!(err, ApiError::Unauthorized(_)));
    /// ```
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a new not-found error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stagepass_server::error::ApiError;
    ///
    /// let err = ApiError::not_found("event 42 not found");
    /// assert!(matches!(err, ApiError::NotFound(_)));
    /// ```
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a new conflict error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stagepass_server::error::ApiError;
    ///
    /// let err = ApiError::conflict("event 42 still has artists or resources");
    /// assert!(matches!(err, ApiError::Conflict(_)));
    /// ```
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns `true` if this error indicates a client-side problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }

    /// Returns `true` if this error indicates a server-side problem.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            Self::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            Self::Database(err) => classify_database_error(err),
            Self::Internal(message) => {
                error!(error = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: Some(code.to_string()),
            }),
        )
            .into_response()
    }
}

/// Maps a store error to a status, code, and safe message.
///
/// The only foreign key in the schema points at `events`, so a constraint
/// violation always means the referenced event is missing.
fn classify_database_error(err: sqlx::Error) -> (StatusCode, &'static str, String) {
    match &err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "not_found",
            "record not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => match db_err.kind() {
            sqlx::error::ErrorKind::ForeignKeyViolation => (
                StatusCode::CONFLICT,
                "conflict",
                "referenced event does not exist".to_string(),
            ),
            _ => {
                error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        },
        _ => {
            error!(error = %err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".to_string(),
            )
        }
    }
}

/// A specialized Result type for request handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
