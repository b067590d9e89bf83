//! Error taxonomy for the request lifecycle.
//!
//! Cancellation is deliberately its own variant: a superseded or torn-down
//! request must never reach the user-facing error channel, so every
//! completion handler branches on [`RequestError::is_cancellation`] before
//! converting anything into an [`ErrorInfo`].

use serde::Serialize;
use thiserror::Error;

/// Failure modes of a single remote operation.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The operation was intentionally aborted: superseded by a newer
    /// generation, torn down, or its activation toggle was switched off.
    #[error("request canceled")]
    Canceled,

    /// The request never produced a usable response from the backend.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        cause: Option<String>,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response arrived but did not match the expected contract.
    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl RequestError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RequestError::Canceled)
    }

    pub fn transport(message: impl Into<String>, cause: Option<String>) -> Self {
        RequestError::Transport {
            message: message.into(),
            cause,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        RequestError::Malformed {
            message: message.into(),
        }
    }
}

/// The error payload carried inside request state, passed upward intact so
/// the consuming boundary can render it (or substitute its own generic
/// message when `message` is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: Option<String>,
}

impl From<&RequestError> for ErrorInfo {
    fn from(err: &RequestError) -> Self {
        match err {
            // Guarded by is_cancellation() at every call site; keep a
            // recognizable payload rather than panicking if one slips by.
            RequestError::Canceled => ErrorInfo {
                message: "request canceled".to_string(),
                cause: None,
            },
            RequestError::Transport { message, cause } => ErrorInfo {
                message: message.clone(),
                cause: cause.clone(),
            },
            RequestError::Status { status, message } => ErrorInfo {
                message: message.clone(),
                cause: Some(format!("status {status}")),
            },
            RequestError::Malformed { message } => ErrorInfo {
                message: message.clone(),
                cause: Some("malformed response".to_string()),
            },
        }
    }
}
