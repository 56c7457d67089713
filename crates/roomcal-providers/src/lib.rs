//! FeedSource trait and implementations.
//!
//! This crate retrieves the raw iCal text of each department and hands it to
//! the transducer in `roomcal-core`:
//!
//! - [`FeedSource`] - The trait every feed backend implements
//! - [`HttpFeedSource`] - Export URLs, optionally through a relay
//! - [`FileFeedSource`] - Local `.ics` files
//! - [`FeedLocator`] - Parses a configured `feed` value into a source
//! - [`ProviderError`] - Error types for retrieval
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Booking site   │    │   Local .ics    │
//! └────────┬────────┘    └────────┬────────┘
//!          │ (relay)              │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │ HttpFeedSource  │    │ FileFeedSource  │
//! └────────┬────────┘    └────────┬────────┘
//!          │      FeedSource      │
//!          └──────────┬───────────┘
//!                     ▼ fetch_occupancy()
//!              ┌──────────────┐
//!              │  FeedParse   │
//!              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use roomcal_providers::{FeedLocator, SourceOptions, fetch_occupancy, source_from_locator};
//!
//! let locator: FeedLocator = "webcal://example.com/dept-1.ics".parse()?;
//! let source = source_from_locator(&locator, &SourceOptions::new())?;
//! let parse = fetch_occupancy(source.as_ref()).await?;
//! ```

pub mod error;
pub mod file;
#[cfg(feature = "http")]
pub mod http;
pub mod locator;
pub mod source;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use file::FileFeedSource;
#[cfg(feature = "http")]
pub use http::HttpFeedSource;
pub use locator::{FeedLocator, source_from_locator};
pub use source::{BoxFuture, ErrorSource, FeedSource, SourceOptions, StaticSource, fetch_occupancy};
