//! Server error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised by a [`SnapshotStore`](crate::SnapshotStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or renaming the snapshot file failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stored snapshot is not valid JSON of the expected shape.
    #[error("Corrupt snapshot in {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be serialized.
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The storage key cannot be used as a file name.
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur in the sync engine.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Loading or saving the snapshot failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A blocking store call panicked or was cancelled.
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
