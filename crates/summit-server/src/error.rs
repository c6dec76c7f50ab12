//! Server and API error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use summit_core::{FilterError, KeyError, LedgerError, StoreError};
use thiserror::Error;

/// Errors returned by API operations. Each maps to one HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No authenticated caller.
    #[error("authorization required")]
    AuthenticationRequired,

    /// Caller is not allowed to touch the resource.
    #[error("{0}")]
    Authorization(String),

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Store failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::AuthenticationRequired => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Authorization(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl From<KeyError> for ApiError {
    fn from(err: KeyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store failure");
        Self::Internal(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ConferenceNotFound(_) | LedgerError::SessionNotFound(_) => {
                Self::NotFound(err.to_string())
            },
            LedgerError::AlreadyRegistered
            | LedgerError::SoldOut
            | LedgerError::AlreadyWishlisted => Self::Conflict(err.to_string()),
            LedgerError::Store(err) => err.into(),
        }
    }
}

/// Error body detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Stable error code
    pub error_code: String,
    /// Human readable message
    pub message: String,
}

/// Error response body: `{"error": {"errorCode": ..., "message": ...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Detail
    pub error: ErrorDetail,
}

impl ErrorResponse {
    /// Build a body from a code and message.
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self { error: ErrorDetail { error_code: error_code.to_string(), message: message.into() } }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from running the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket error
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
