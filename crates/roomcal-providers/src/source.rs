//! FeedSource trait definition.
//!
//! A [`FeedSource`] knows how to retrieve the raw calendar text of one
//! department. It does not parse anything: [`fetch_occupancy`] runs the
//! retrieval and hands the text to the transducer, which cannot fail.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use roomcal_core::{FeedParse, parse_feed};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object safe, so the sync engine can hold a
/// `Vec<Arc<dyn FeedSource>>` of mixed source kinds.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options shared by every source built from configuration.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Prefix the percent-encoded feed URL is appended to, e.g.
    /// `https://corsproxy.io/?`. `None` fetches the feed directly.
    pub relay: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with HTTP requests.
    pub user_agent: String,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            relay: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("roomcal/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: true,
        }
    }
}

impl SourceOptions {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relay(mut self, relay: impl Into<String>) -> Self {
        self.relay = Some(relay.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }
}

/// Retrieval of one department's calendar feed.
///
/// Implementations must not share mutable state between calls: the sync
/// engine invokes every source concurrently.
pub trait FeedSource: Send + Sync {
    /// Short name of the source type ("http", "file", ...).
    fn kind(&self) -> &str;

    /// Human-readable location of the feed, for logs.
    fn locator(&self) -> String;

    /// Retrieves the raw feed text.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport failures, non-success statuses
    /// and unreadable files.
    fn fetch_feed(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// Retrieves a feed and converts it to occupancy.
///
/// # Errors
///
/// Only retrieval can fail; once text is available the parse always
/// completes.
pub async fn fetch_occupancy(source: &dyn FeedSource) -> ProviderResult<FeedParse> {
    let text = source.fetch_feed().await?;
    debug!(
        kind = source.kind(),
        locator = %source.locator(),
        bytes = text.len(),
        "Fetched feed"
    );

    let parse = parse_feed(&text);
    if let Some(first) = parse.warnings.first() {
        warn!(
            locator = %source.locator(),
            count = parse.warnings.len(),
            first = %first,
            "Feed contained anomalies"
        );
    }
    Ok(parse)
}

/// A source that serves fixed text.
///
/// Used for dry runs and tests.
#[derive(Debug, Clone)]
pub struct StaticSource {
    label: String,
    text: String,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl FeedSource for StaticSource {
    fn kind(&self) -> &str {
        "static"
    }

    fn locator(&self) -> String {
        self.label.clone()
    }

    fn fetch_feed(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let text = self.text.clone();
        Box::pin(async move { Ok(text) })
    }
}

/// A source that always fails.
///
/// Stands in for a department whose feed locator could not be turned into a
/// source, so the failure shows up in every sync instead of at startup only.
#[derive(Debug)]
pub struct ErrorSource {
    locator: String,
    error: ProviderError,
}

impl ErrorSource {
    pub fn new(locator: impl Into<String>, error: ProviderError) -> Self {
        Self {
            locator: locator.into(),
            error,
        }
    }
}

impl FeedSource for ErrorSource {
    fn kind(&self) -> &str {
        "error"
    }

    fn locator(&self) -> String {
        self.locator.clone()
    }

    fn fetch_feed(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let error = ProviderError::new(self.error.code(), self.error.message())
            .with_source_kind(self.kind());
        Box::pin(async move { Err(error) })
    }
}
