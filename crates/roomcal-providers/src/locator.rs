//! Feed locators: the `feed` value of a department in the configuration.
//!
//! Accepted forms:
//!
//! - `https://...` and `http://...` fetched over HTTP
//! - `webcal://...` rewritten to `https://...`
//! - `file:///path/to/feed.ics` or a bare path, read from disk

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::file::FileFeedSource;
use crate::source::{FeedSource, SourceOptions};

/// Where a department's feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocator {
    Http(Url),
    File(PathBuf),
}

impl FeedLocator {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::File(_) => "file",
        }
    }
}

impl fmt::Display for FeedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for FeedLocator {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProviderError::configuration("Feed locator is empty"));
        }

        if !s.contains("://") {
            return Ok(Self::File(PathBuf::from(s)));
        }

        let url = Url::parse(s).map_err(|e| {
            ProviderError::configuration(format!("Invalid feed URL '{}': {}", s, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            "webcal" => {
                let rewritten = format!("https{}", &s[s.find("://").unwrap_or(0)..]);
                Url::parse(&rewritten).map(Self::Http).map_err(|e| {
                    ProviderError::configuration(format!("Invalid feed URL '{}': {}", s, e))
                })
            }
            "file" => url.to_file_path().map(Self::File).map_err(|_| {
                ProviderError::configuration(format!("Invalid file URL '{}'", s))
            }),
            other => Err(ProviderError::configuration(format!(
                "Unsupported feed scheme '{}'",
                other
            ))),
        }
    }
}

/// Builds the source for a locator.
///
/// # Errors
///
/// Returns a configuration error if the locator needs a source type that was
/// not compiled in, or the HTTP client cannot be built.
pub fn source_from_locator(
    locator: &FeedLocator,
    options: &SourceOptions,
) -> ProviderResult<Box<dyn FeedSource>> {
    match locator {
        #[cfg(feature = "http")]
        FeedLocator::Http(url) => Ok(Box::new(crate::http::HttpFeedSource::new(
            url.clone(),
            options,
        )?)),
        #[cfg(not(feature = "http"))]
        FeedLocator::Http(url) => {
            let _ = options;
            Err(ProviderError::configuration(format!(
                "HTTP feeds are not supported in this build: {}",
                url
            )))
        }
        FeedLocator::File(path) => Ok(Box::new(FileFeedSource::new(path.clone()))),
    }
}
