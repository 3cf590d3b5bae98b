//! Error types for modelvault.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::ValidationFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Auth errors
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Validation errors
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Local persistence
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    // Remote archive and identity collaborators
    #[error("Remote archive error: {0}")]
    Remote(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401
            Self::Unauthenticated | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            // 404
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 413
            Self::Validation(ValidationFailure::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,

            // 400
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,

            // 502
            Self::Remote(_) => StatusCode::BAD_GATEWAY,

            // 500
            Self::Storage(_) | Self::Internal(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(ValidationFailure::TooLarge { .. }) => "FILE_TOO_LARGE",
            Self::Validation(ValidationFailure::UnsupportedType { .. }) => "INVALID_FILE_TYPE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Remote(_) => "REMOTE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Other(_) => "UNKNOWN_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}
