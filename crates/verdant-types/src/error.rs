//! Error types for data parsing in verdant-types.

use thiserror::Error;

/// Errors that can occur when parsing gateway data.
///
/// This error type is transport-agnostic and does not include
/// HTTP-specific errors (those belong in verdant-core).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Timestamp string could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Log file name does not follow the `DDMMYY[.json]` convention.
    #[error("Invalid log file name: {0}")]
    InvalidLogName(String),
}

/// Result type alias using verdant-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
