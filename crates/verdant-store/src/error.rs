//! Error types for verdant-store.

use std::path::PathBuf;

/// Result type for verdant-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in verdant-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No catalog entry for the given log file.
    #[error("Log not found in catalog: {0}")]
    LogNotFound(String),

    /// Stored timestamp is outside the representable range.
    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
