//! Error types for scorecard-sync
//!
//! One variant per failure family in the sync protocol. Validation, auth,
//! and authorization errors short-circuit before any store mutation; source,
//! persistence, and configuration errors surface as 500-family responses
//! with distinct error codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sheets::SourceError;

/// Sync pipeline error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed request (400); no side effects occurred
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Missing or invalid caller credential (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacks the sync capability (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource absent, e.g. discovery found no tabs (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sync run is already active for the same scope (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote tabular source failed or returned nothing usable (500)
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Metric store write failure (500)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Missing or unusable service credential (500)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            SyncError::Validation(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            SyncError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            SyncError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            SyncError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            SyncError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            SyncError::SourceUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SOURCE_UNAVAILABLE",
                msg,
            ),
            SyncError::Persistence(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                msg,
            ),
            SyncError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg,
            ),
            SyncError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            SyncError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<scorecard_common::Error> for SyncError {
    fn from(err: scorecard_common::Error) -> Self {
        match err {
            scorecard_common::Error::Database(e) => SyncError::Persistence(e.to_string()),
            scorecard_common::Error::Config(msg) => SyncError::Configuration(msg),
            scorecard_common::Error::NotFound(msg) => SyncError::NotFound(msg),
            scorecard_common::Error::InvalidInput(msg) => SyncError::Validation(msg),
            scorecard_common::Error::Io(e) => SyncError::Internal(e.to_string()),
            scorecard_common::Error::Internal(msg) => SyncError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<SourceError> for SyncError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NoTabs => SyncError::NotFound("No sheet tabs found".to_string()),
            SourceError::InsufficientData => {
                SyncError::SourceUnavailable("No data found in sheet".to_string())
            }
            SourceError::Credential(e) => SyncError::Configuration(e.to_string()),
            SourceError::Request(e) => SyncError::SourceUnavailable(e.to_string()),
            SourceError::Unavailable(msg) => SyncError::SourceUnavailable(msg),
        }
    }
}

/// Result type for the sync pipeline
pub type SyncResult<T> = Result<T, SyncError>;
