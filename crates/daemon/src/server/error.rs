//! Mapping of internal failures onto HTTP responses.
//!
//! Response bodies only ever carry a generic message. The underlying error is
//! logged server-side; neither the body nor the log line includes the
//! configured secret.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use protocol::ErrorBody;
use tokio::task::JoinError;

use crate::files::{AssetError, BrowserError, PathError};
use crate::metrics::MetricsError;

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed or escaping path.
    #[error("invalid path")]
    InvalidPath(#[from] PathError),

    /// Query string that does not fit the endpoint's parameters.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),

    /// Target is absent or of the wrong kind.
    #[error("not found")]
    NotFound,

    /// Filesystem failure other than absence.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// Metrics collection failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// A blocking task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPath(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Io(_) | ApiError::Metrics(_) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::InvalidPath(_) => "invalid path",
            ApiError::InvalidQuery(_) => "invalid query",
            ApiError::NotFound => "not found",
            ApiError::Io(_) | ApiError::Task(_) => "internal error",
            ApiError::Metrics(_) => "Failed to get system info",
        }
    }
}

impl From<BrowserError> for ApiError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::NotFound | BrowserError::NotADirectory | BrowserError::IsADirectory => {
                ApiError::NotFound
            }
            BrowserError::Io(e) => ApiError::Io(e),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Path(e) => e.into(),
            AssetError::Browser(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}
