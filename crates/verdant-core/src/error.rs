//! Failure taxonomy for gateway and cloud calls.
//!
//! Every network operation in this engine resolves to either its value or a
//! [`Failure`]. The taxonomy is deliberately closed: callers branch on it
//! exhaustively, and no component surfaces a transport error as an opaque
//! panic or an unrecoverable crash.
//!
//! # Recovery
//!
//! | Failure | Transient? | Typical handling |
//! |---------|------------|------------------|
//! | [`Failure::Connection`] | Yes | degrade to cache, retry on user action |
//! | [`Failure::Timeout`] | Yes | degrade to cache, retry on user action |
//! | [`Failure::Server`] 5xx | Yes | retry with backoff |
//! | [`Failure::Server`] 4xx | No | report |
//! | [`Failure::NotFound`] | No | skip the file, keep the previous copy |
//! | [`Failure::Unknown`] | No | report |

use std::time::Duration;

use thiserror::Error;

/// A classified gateway or cloud call failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// No response from the other end: the host is unreachable or refused.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The request exceeded the fixed client timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The other end answered with a non-2xx status.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anything that escaped the categories above.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl Failure {
    /// Classify a transport-level reqwest error.
    ///
    /// Status-carrying responses are classified separately via
    /// [`Failure::from_status`]; by the time an error reaches here the
    /// request either never completed or its body could not be decoded.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Failure::Timeout(timeout);
        }
        if let Some(status) = err.status() {
            return Failure::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return Failure::Unknown(format!("invalid response body: {err}"));
        }
        Failure::Connection(err.to_string())
    }

    /// Classify a non-2xx HTTP status.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        let message = if message.is_empty() {
            format!("HTTP {status}")
        } else {
            message
        };
        if status == 404 {
            Failure::NotFound(message)
        } else {
            Failure::Server { status, message }
        }
    }

    /// Whether retrying the same call can plausibly succeed.
    ///
    /// Connection failures, timeouts, and 5xx responses are transient;
    /// 4xx responses, missing resources, and decode errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Failure::Connection(_) | Failure::Timeout(_) => true,
            Failure::Server { status, .. } => *status >= 500,
            Failure::NotFound(_) | Failure::Unknown(_) => false,
        }
    }
}

impl From<verdant_types::ParseError> for Failure {
    fn from(err: verdant_types::ParseError) -> Self {
        Failure::Unknown(format!("malformed gateway payload: {err}"))
    }
}

/// Result type alias using the engine's Failure taxonomy.
pub type Result<T> = std::result::Result<T, Failure>;
