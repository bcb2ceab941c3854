//! Error types and HTTP status classification for DataCite API responses.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataCiteError>;

/// Errors returned by the DataCite client.
///
/// HTTP variants carry the status code and the raw response body so callers
/// can branch on the kind and still inspect what the server said.
#[derive(Debug, Error)]
pub enum DataCiteError {
    /// HTTP 401: missing or wrong credentials.
    #[error("Unauthorized (HTTP 401): {body}")]
    Unauthorized { body: String },

    /// HTTP 403: credentials valid but not allowed for this prefix or DOI.
    #[error("Forbidden (HTTP 403): {body}")]
    Forbidden { body: String },

    /// HTTP 404
    #[error("Not found (HTTP 404): {body}")]
    NotFound { body: String },

    /// HTTP 410: the DOI was deleted.
    #[error("Gone (HTTP 410): {body}")]
    Gone { body: String },

    /// HTTP 204 where a document was expected.
    #[error("No content (HTTP 204): {body}")]
    NoContent { body: String },

    /// HTTP 412
    #[error("Precondition failed (HTTP 412): {body}")]
    PreconditionFailed { body: String },

    /// Any 5xx status.
    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// Any other unexpected status.
    #[error("Request error (HTTP {status}): {body}")]
    Request { status: u16, body: String },

    /// The DOI carries a prefix other than the one the client was configured with.
    #[error("DOI prefix '{found}' does not match the configured prefix '{expected}'")]
    PrefixMismatch { expected: String, found: String },

    #[error("Invalid DOI: {0}")]
    InvalidDoi(String),

    /// Connection failures, timeouts and other transport problems.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success status whose body did not have the expected shape.
    #[error("Unexpected response from DataCite: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataCiteError {
    /// Maps a non-success HTTP status and its body to an error.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            StatusCode::UNAUTHORIZED => DataCiteError::Unauthorized { body },
            StatusCode::FORBIDDEN => DataCiteError::Forbidden { body },
            StatusCode::NOT_FOUND => DataCiteError::NotFound { body },
            StatusCode::GONE => DataCiteError::Gone { body },
            StatusCode::NO_CONTENT => DataCiteError::NoContent { body },
            StatusCode::PRECONDITION_FAILED => DataCiteError::PreconditionFailed { body },
            s if s.is_server_error() => DataCiteError::Server {
                status: s.as_u16(),
                body,
            },
            s => DataCiteError::Request {
                status: s.as_u16(),
                body,
            },
        }
    }

    /// HTTP status code for errors that came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            DataCiteError::Unauthorized { .. } => Some(401),
            DataCiteError::Forbidden { .. } => Some(403),
            DataCiteError::NotFound { .. } => Some(404),
            DataCiteError::Gone { .. } => Some(410),
            DataCiteError::NoContent { .. } => Some(204),
            DataCiteError::PreconditionFailed { .. } => Some(412),
            DataCiteError::Server { status, .. } | DataCiteError::Request { status, .. } => {
                Some(*status)
            }
            DataCiteError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body for errors that came from a response.
    pub fn body(&self) -> Option<&str> {
        match self {
            DataCiteError::Unauthorized { body }
            | DataCiteError::Forbidden { body }
            | DataCiteError::NotFound { body }
            | DataCiteError::Gone { body }
            | DataCiteError::NoContent { body }
            | DataCiteError::PreconditionFailed { body }
            | DataCiteError::Server { body, .. }
            | DataCiteError::Request { body, .. } => Some(body),
            _ => None,
        }
    }
}
