//! Typed errors and HTTP mapping.

use hyper::{Method, StatusCode};
use thiserror::Error;

use crate::response::HttpResponse;

/// Path template compilation failures. Raised at registration time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid parameter name ':{0}': names are one or more ASCII letters")]
    InvalidParamName(String),
    #[error("duplicate parameter name ':{0}'")]
    DuplicateParam(String),
    #[error("':query' is reserved for the query-string capture")]
    ReservedParam,
}

/// Endpoint registration failures. Fatal to startup.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("endpoint already exists: {method} {path}")]
    DuplicateEndpoint { method: Method, path: String },
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Document store failures. "Not found" conditions are sentinel returns
/// (`None` / `false`), never errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Request-time errors, surfaced to the client as `{"error": "<message>"}`
/// with the corresponding status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,
    /// Handler-chosen error, surfaced verbatim with its status.
    #[error("{message}")]
    App { status: StatusCode, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn app(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::App {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::App { status, .. } => *status,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client. Internal detail is logged by the
    /// server, never leaked in a response body.
    pub fn public_message(&self) -> &str {
        match self {
            ApiError::NotFound => "Not Found",
            ApiError::App { message, .. } => message,
            ApiError::Store(_) | ApiError::Internal(_) => "Internal Server Error",
        }
    }

    pub(crate) fn into_response(self) -> HttpResponse {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::error(self.status(), self.public_message())
    }
}
