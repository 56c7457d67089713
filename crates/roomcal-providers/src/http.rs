//! Feeds published over HTTP.
//!
//! Booking platforms expose each department's calendar at an export URL.
//! When a relay is configured the feed URL is percent-encoded and appended
//! to the relay prefix, e.g. `https://corsproxy.io/?https%3A%2F%2F...`.

use reqwest::{Client, Response, StatusCode};
use tracing::{trace, warn};
use url::Url;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::source::{BoxFuture, FeedSource, SourceOptions};

/// A feed fetched with a single GET request.
pub struct HttpFeedSource {
    client: Client,
    url: Url,
    relay: Option<String>,
}

impl HttpFeedSource {
    /// Creates a source for `url`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(url: Url, options: &SourceOptions) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!options.verify_tls)
            .timeout(options.timeout)
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source_kind("http")
            })?;

        Ok(Self {
            client,
            url,
            relay: options.relay.clone(),
        })
    }

    /// The URL actually requested.
    pub fn request_url(&self) -> String {
        request_url(self.relay.as_deref(), &self.url)
    }

    async fn fetch(&self) -> ProviderResult<String> {
        let target = self.request_url();
        trace!(url = %target, "Sending request");

        let response = self.client.get(&target).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("Request timed out: {}", e)
            } else {
                format!("Request failed: {}", e)
            };
            ProviderError::network(message).with_cause(e)
        })?;

        handle_response(response).await
    }
}

impl FeedSource for HttpFeedSource {
    fn kind(&self) -> &str {
        "http"
    }

    fn locator(&self) -> String {
        redacted(&self.url)
    }

    fn fetch_feed(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move { self.fetch().await.map_err(|e| e.with_source_kind("http")) })
    }
}

/// The feed URL with its query replaced by `?…`.
///
/// Export URLs carry their access token in the query string.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    let _ = shown.set_password(None);
    match url.query() {
        Some(_) => format!("{}?…", shown),
        None => shown.to_string(),
    }
}

/// Applies the relay prefix to a feed URL.
pub fn request_url(relay: Option<&str>, url: &Url) -> String {
    match relay {
        Some(prefix) => format!("{}{}", prefix, urlencoding::encode(url.as_str())),
        None => url.to_string(),
    }
}

async fn handle_response(response: Response) -> ProviderResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if let Some(error) = status_error(status) {
        if error.code() == ProviderErrorCode::InvalidResponse {
            warn!(status = %status, "Unexpected response status");
        }
        return Err(error);
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::invalid_response(format!("Failed to read response: {}", e)))
}

/// Maps a non-success status to an error. Returns `None` for 2xx.
pub fn status_error(status: StatusCode) -> Option<ProviderError> {
    let error = match status {
        s if s.is_success() => return None,
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("Feed host rejected the request")
        }
        StatusCode::FORBIDDEN => ProviderError::authorization("Access to feed denied"),
        StatusCode::NOT_FOUND => ProviderError::not_found("Feed not found"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited("Too many requests"),
        s if s.is_server_error() => ProviderError::server(format!("Server error ({})", s)),
        s => ProviderError::invalid_response(format!("Unexpected status {}", s)),
    };
    Some(error)
}
