use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepositoryError;

/// AppError
///
/// Every handler and extractor failure funnels into this type. It renders as the
/// `{ "success": false, "message": ... }` body the dashboard and store apps expect.
#[derive(Debug, Error)]
pub enum AppError {
    /// Field-level validation failed before reaching persistence.
    #[error("{0}")]
    Validation(String),

    /// The request is well-formed but violates a business rule.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not allow the operation.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The external identity provider failed or rejected the call.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Wire shape of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Rejected(_)) => StatusCode::BAD_REQUEST,
            Self::Repository(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

// Malformed bodies, path segments and query strings answer 400 with the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but never leaked to the client.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match self {
                Self::Upstream(_) => "Authentication service unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            match self {
                Self::Repository(RepositoryError::Conflict(what)) => {
                    format!("{} already exists", what)
                }
                Self::Repository(RepositoryError::Rejected(reason)) => reason,
                other => other.to_string(),
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
