//! Error types for feed retrieval.
//!
//! Retrieval errors never reach the transducer: the sync engine records them
//! as a failed outcome for the resource and moves on.

use std::fmt;
use thiserror::Error;

/// The category of a retrieval error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The feed host (or relay) rejected the credentials in the URL.
    AuthenticationFailed,
    /// Access to the feed is forbidden.
    AuthorizationFailed,
    /// Connection failed, timed out, DNS resolution failed, etc.
    NetworkError,
    /// Too many requests.
    RateLimited,
    /// The feed host or relay returned a 5xx status.
    ServerError,
    /// Unexpected status or unreadable body.
    InvalidResponse,
    /// Feed URL or file does not exist.
    NotFound,
    /// The feed locator or source options are invalid.
    ConfigurationError,
    /// Local I/O failed while reading a feed file.
    IoError,
}

impl ProviderErrorCode {
    /// Returns true if a later attempt may succeed without any change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::ConfigurationError => "configuration_error",
            Self::IoError => "io_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that occurred while retrieving a feed.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Kind of source that failed ("http", "file", ...).
    source_kind: Option<String>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_kind: None,
            cause: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::IoError, message)
    }

    /// Tags the error with the kind of source that produced it.
    pub fn with_source_kind(mut self, kind: impl Into<String>) -> Self {
        self.source_kind = Some(kind.into());
        self
    }

    /// Attaches the underlying error.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_kind(&self) -> Option<&str> {
        self.source_kind.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref kind) = self.source_kind {
            write!(f, "[{}] ", kind)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for retrieval operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
