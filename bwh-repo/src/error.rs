//! Error types.

use serde::Serialize;
use thiserror::Error;

/// Failures raised by a [`Transport`](crate::clients::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP 401.
    #[error("unauthorized (HTTP 401)")]
    Unauthorized,

    /// HTTP 500. BorgWarehouse answers a rejected SSH key this way.
    #[error("server rejected request (HTTP 500)")]
    ServerRejected,

    /// HTTP 404.
    #[error("not found (HTTP 404)")]
    NotFound,

    /// Connection, DNS or timeout failure, or a base URL that cannot be used.
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {reason}")]
    OtherHttp { status: u16, reason: String },
}

impl TransportError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            500 => Self::ServerRejected,
            _ => Self::OtherHttp {
                status,
                reason: reason.into(),
            },
        }
    }
}

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Body could not be encoded, or a response did not have the expected shape.
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response was valid JSON but semantically unusable.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for client and reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescription {
    pub kind: &'static str,
    pub msg: String,
}

impl Error {
    /// Map the error onto the caller-facing message taxonomy.
    pub fn describe(&self) -> ErrorDescription {
        let (kind, msg) = match self {
            Error::Transport(TransportError::Unauthorized) => {
                ("unauthorized", "HTTP Error 401: Bad API token".to_string())
            }
            Error::Transport(TransportError::ServerRejected) => (
                "server_rejected",
                "HTTP Error 500: Bad SSH public key".to_string(),
            ),
            Error::Transport(TransportError::NetworkUnreachable(_)) => {
                ("network_unreachable", "URL Error: Bad URL".to_string())
            }
            Error::Transport(TransportError::NotFound) => {
                ("not_found", "HTTP Error 404: Not Found".to_string())
            }
            Error::Transport(TransportError::OtherHttp { status, reason }) => {
                ("http", format!("HTTP Error {}: {}", status, reason))
            }
            Error::Decode(e) => ("decode", format!("Decode: {}", e)),
            Error::Malformed(m) => ("decode", format!("Malformed: {}", m)),
        };
        ErrorDescription { kind, msg }
    }
}
