//! Error types
//!
//! Transport failures are never raised out of a request; they travel inside
//! the [`Envelope`](crate::network::Envelope) so callers inspect them there.

use crate::document::ErrorObject;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors produced while issuing a request or reading its response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The request never produced a response (connection refused, DNS, TLS...)
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not valid JSON or not a valid document
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The server answered with a status >= 400
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A successful status whose document carries top-level `errors`
    #[error("document contains {} error(s)", .0.len())]
    Document(Vec<ErrorObject>),
}

impl TransportError {
    /// Build the error used for a non-success HTTP status.
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            message: format!("Invalid HTTP status: {}", status),
        }
    }

    /// HTTP status carried by this error, if known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
