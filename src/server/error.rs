//! Maps share service failures to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::share_service::{ShareServiceError, MAX_CONTENT_LENGTH};

/// Error body returned by every API endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// An API failure, already sorted into the status it will be reported with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    NotFound(String),

    /// Refused by an extractor before the handler ran
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Unexpected failure; `message` is what the client sees, `cause` is logged
    #[error("{message}: {cause}")]
    Internal {
        message: &'static str,
        cause: String,
    },
}

impl ApiError {
    /// Wrap an unexpected failure behind a generic client-facing message
    pub fn internal(message: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            message,
            cause: cause.to_string(),
        }
    }

    /// Classify a share service error; `message` is used if it is unexpected
    pub fn from_service(err: ShareServiceError, message: &'static str) -> Self {
        match err {
            ShareServiceError::EmptyContent => Self::BadRequest(err.to_string()),
            ShareServiceError::ContentTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            ShareServiceError::NotFound(_) => Self::NotFound("Share not found".to_string()),
            ShareServiceError::Storage(e) => Self::internal(message, e),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Rejected { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    /// Keep the extractor's status. A body over the transport limit is
    /// reported like any other oversized submission.
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(format!(
                "Content exceeds maximum size of {}KB",
                MAX_CONTENT_LENGTH / 1000
            )),
            status => Self::Rejected {
                status,
                message: rejection.body_text(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::BadRequest(msg) | Self::PayloadTooLarge(msg) | Self::NotFound(msg) => msg,
            Self::Rejected { message, .. } => message,
            Self::Internal { message, cause } => {
                tracing::error!(error = %cause, "{}", message);
                message.to_string()
            }
        };

        (status, Json(ApiErrorResponse { error })).into_response()
    }
}
