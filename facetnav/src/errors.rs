use axum::http::StatusCode;
use thiserror::Error;

/// Top-level error type returned by the adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The wire request could not be decoded (e.g. an unparsable JSON body).
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    /// The request decoded but carried an unusable parameter.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A route could not be registered.
    #[error("invalid route '{pattern}': {message}")]
    InvalidRoute { pattern: String, message: String },

    /// The backend failed to execute the query.
    #[error("search failed: {0}")]
    Search(#[from] BackendError),

    /// The response document could not be serialized.
    #[error("response serialization failed: {0}")]
    Response(#[from] serde_json::Error),
}

impl AdapterError {
    /// HTTP status surfaced to the client for this error.
    ///
    /// Input and query-execution failures are client-visible 400s; anything
    /// raised while assembling the response is an internal 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdapterError::MalformedRequest { .. }
            | AdapterError::InvalidRequest { .. }
            | AdapterError::Search(_) => StatusCode::BAD_REQUEST,
            AdapterError::InvalidRoute { .. } | AdapterError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure reported by a search backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The query is malformed or cannot be satisfied.
    #[error("query rejected: {message}")]
    Rejected { message: String },

    /// The route referenced an index the backend does not know.
    #[error("unknown index: {index}")]
    UnknownIndex { index: String },
}

impl BackendError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
