//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Feed retrieval error.
    Provider(String),
    /// Snapshot store error.
    Store(String),
    /// A sync ran but produced nothing usable.
    Sync(String),
    /// Logging could not be set up.
    Tracing(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "feed error: {}", msg),
            Self::Store(msg) => write!(f, "store error: {}", msg),
            Self::Sync(msg) => write!(f, "sync failed: {}", msg),
            Self::Tracing(msg) => write!(f, "logging setup failed: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<roomcal_providers::ProviderError> for ClientError {
    fn from(err: roomcal_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<roomcal_server::StoreError> for ClientError {
    fn from(err: roomcal_server::StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<roomcal_server::ServerError> for ClientError {
    fn from(err: roomcal_server::ServerError) -> Self {
        match err {
            roomcal_server::ServerError::Store(e) => e.into(),
            roomcal_server::ServerError::Task(e) => Self::Store(e.to_string()),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<roomcal_core::TracingError> for ClientError {
    fn from(err: roomcal_core::TracingError) -> Self {
        Self::Tracing(err.to_string())
    }
}
