use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::ErrorResponse, password::PasswordError, stores::StoreError, token::TokenError};

/// ApiError
///
/// Every failure a handler can return. Each variant maps to exactly one status code,
/// and the body is always `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400).
    #[error("{0}")]
    Validation(String),
    /// Missing, malformed or expired bearer token (401).
    #[error("{0}")]
    Authentication(String),
    /// Authenticated but not permitted (403).
    #[error("{0}")]
    Authorization(String),
    /// Entity absent or soft-deleted (404).
    #[error("{0}")]
    NotFound(String),
    /// Duplicate value in a unique field (409).
    #[error("{0}")]
    Conflict(String),
    /// Anything unexpected (500). The source is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::Internal(Box::new(source))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(source) => {
                tracing::error!(error = %source, "request failed with an internal error");
                "Internal server error".to_string()
            }
            ApiError::Validation(message)
            | ApiError::Authentication(message)
            | ApiError::Authorization(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(constraint) => {
                tracing::warn!(%constraint, "unique constraint rejected a write");
                ApiError::Conflict("Resource already exists".to_string())
            }
            StoreError::Database(source) => ApiError::internal(source),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => ApiError::Authentication("Invalid token".to_string()),
            TokenError::Signing(_) => ApiError::internal(err),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected request body");
        ApiError::Validation("Invalid request payload".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(%rejection, "rejected path parameter");
        ApiError::Validation("Invalid path parameter".to_string())
    }
}

/// Gives a store "not found" a resource-specific message while letting every other
/// store error take its default mapping.
pub trait StoreResultExt<T> {
    fn or_not_found(self, message: &str) -> ApiResult<T>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_not_found(self, message: &str) -> ApiResult<T> {
        self.map_err(|err| match err {
            StoreError::NotFound => ApiError::NotFound(message.to_string()),
            other => other.into(),
        })
    }
}
