/// Unified error types for the corporate site backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the site backend
#[derive(Error, Debug)]
pub enum SiteError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Blob storage errors
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (stale settings version)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The editor is waiting on a submit and refuses edits
    #[error("Editor is busy saving")]
    EditorBusy,

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert SiteError to HTTP response
impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            SiteError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            SiteError::Authorization(_) => (StatusCode::FORBIDDEN, "Forbidden", self.to_string()),
            SiteError::Validation(_) | SiteError::Serialization(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            SiteError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            SiteError::Conflict(_) | SiteError::EditorBusy => {
                (StatusCode::CONFLICT, "Conflict", self.to_string())
            }
            SiteError::Database(_)
            | SiteError::Migration(_)
            | SiteError::Internal(_)
            | SiteError::Io(_)
            | SiteError::BlobStorage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for site operations
pub type SiteResult<T> = Result<T, SiteError>;
