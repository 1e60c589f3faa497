//! HTTP error mapping.
//!
//! Every failure leaves the service as `{"error": "<message>"}`. Only a
//! malformed track ID is the caller's fault (400); everything else is 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ResolverError;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<&ResolverError> for ErrorBody {
    fn from(err: &ResolverError) -> Self {
        Self::new(err.message.clone())
    }
}

/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The resolution itself failed.
    #[error(transparent)]
    Resolve(#[from] ResolverError),

    /// No route matched.
    #[error("not found")]
    NotFound,

    /// Handler fault. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Resolve(e) if e.code.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Resolve(e) => {
                if e.code.is_fetch_error() {
                    tracing::warn!(
                        code = %e.code,
                        kind = e.code.description(),
                        error = %e.message,
                        "media fetch failed"
                    );
                } else if status.is_server_error() {
                    tracing::error!(
                        code = %e.code,
                        kind = e.code.description(),
                        error = %e.message,
                        "resolution failed"
                    );
                }
                ErrorBody::from(e)
            }
            Self::NotFound => ErrorBody::new("Not found"),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                ErrorBody::new("Internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}
