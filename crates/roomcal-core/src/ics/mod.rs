//! Best-effort iCalendar feed to occupancy transducer.
//!
//! The pipeline is line splitting, event extraction, date normalization and
//! range expansion, folded into one [`OccupancyMap`] per feed:
//!
//! ```text
//! raw text ─▶ split_lines ─▶ extract_events ─▶ normalize_date ─▶ expand_range
//!                                                                    │
//!                                                 OccupancyMap ◀─────┘
//! ```
//!
//! Parsing never fails. Anything the transducer cannot make sense of is
//! skipped and reported as a [`FeedWarning`] next to the result.
//!
//! # Example
//!
//! ```
//! use roomcal_core::ics::parse_feed;
//!
//! let parse = parse_feed("BEGIN:VEVENT\nDTSTART:20240610\nDTEND:20240613\nEND:VEVENT\n");
//! assert_eq!(parse.occupancy.blocked_count(), 3);
//! assert!(parse.warnings.is_empty());
//! ```

mod date;
mod extract;
mod lines;

use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::occupancy::OccupancyMap;

pub use date::{DateError, canonical_date, expand_range, normalize_date};
pub use extract::{EventBlock, EventExtractor, Extraction, RawProperty, extract_events};
pub use lines::{FeedLines, split_lines};

/// Which date property a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateProperty {
    Start,
    End,
}

impl DateProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "DTSTART",
            Self::End => "DTEND",
        }
    }
}

/// An anomaly noticed while parsing a feed.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedWarning {
    /// `BEGIN:VEVENT` without a matching `END:VEVENT` before end of input.
    UnterminatedEvent { line: usize },
    /// `BEGIN:VEVENT` while another event was still open.
    NestedEvent { line: usize },
    /// `END:VEVENT` outside of any event.
    StrayEventEnd { line: usize },
    /// Event closed without a usable `DTSTART`.
    MissingStart { line: usize },
    /// A date property whose value could not be normalized.
    InvalidDate {
        line: usize,
        property: DateProperty,
        value: String,
        error: DateError,
    },
    /// `DTEND` is not after `DTSTART`, so the event occupies no day.
    EmptyRange {
        line: usize,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl FeedWarning {
    /// Returns the line the warning points at.
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedEvent { line }
            | Self::NestedEvent { line }
            | Self::StrayEventEnd { line }
            | Self::MissingStart { line }
            | Self::InvalidDate { line, .. }
            | Self::EmptyRange { line, .. } => *line,
        }
    }
}

impl fmt::Display for FeedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedEvent { line } => {
                write!(f, "line {line}: event is never closed")
            }
            Self::NestedEvent { line } => {
                write!(f, "line {line}: event opened inside another event")
            }
            Self::StrayEventEnd { line } => {
                write!(f, "line {line}: END:VEVENT without an open event")
            }
            Self::MissingStart { line } => {
                write!(f, "line {line}: event has no DTSTART")
            }
            Self::InvalidDate {
                line,
                property,
                value,
                error,
            } => write!(
                f,
                "line {line}: {} value {value:?} ignored: {error}",
                property.as_str()
            ),
            Self::EmptyRange { line, start, end } => {
                write!(f, "line {line}: event ends ({end}) before it starts ({start})")
            }
        }
    }
}

/// Result of parsing one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedParse {
    /// Blocked days of the resource.
    pub occupancy: OccupancyMap,
    /// Number of event blocks that had a start.
    pub events: usize,
    /// Anomalies, in the order they were noticed.
    pub warnings: Vec<FeedWarning>,
}

/// Parses raw feed text into the days it occupies.
pub fn parse_feed(text: &str) -> FeedParse {
    let Extraction {
        events,
        mut warnings,
    } = extract_events(split_lines(text));

    let (occupancy, reduce_warnings) = reduce_events(&events);
    warnings.extend(reduce_warnings);

    debug!(
        events = events.len(),
        blocked = occupancy.blocked_count(),
        warnings = warnings.len(),
        "Parsed feed"
    );

    FeedParse {
        occupancy,
        events: events.len(),
        warnings,
    }
}

/// Folds event blocks into one occupancy map.
///
/// Overlapping events block a day once. Blocks whose dates cannot be
/// normalized contribute nothing and produce a warning instead.
pub fn reduce_events(events: &[EventBlock]) -> (OccupancyMap, Vec<FeedWarning>) {
    let mut occupancy = OccupancyMap::new();
    let mut warnings = Vec::new();

    for block in events {
        match occupied_days(block) {
            Ok(days) => occupancy.extend(days),
            Err(warning) => warnings.push(warning),
        }
    }

    (occupancy, warnings)
}

/// Returns the days a single block occupies.
///
/// A block without an end occupies exactly its start day. Otherwise the end
/// is exclusive.
pub fn occupied_days(block: &EventBlock) -> Result<Vec<NaiveDate>, FeedWarning> {
    let start = normalize_property(DateProperty::Start, &block.start)?;

    let Some(end_raw) = &block.end else {
        return Ok(vec![start]);
    };
    let end = normalize_property(DateProperty::End, end_raw)?;

    if end <= start {
        return Err(FeedWarning::EmptyRange {
            line: block.begin_line,
            start,
            end,
        });
    }

    Ok(expand_range(start, end).collect())
}

fn normalize_property(property: DateProperty, raw: &RawProperty) -> Result<NaiveDate, FeedWarning> {
    normalize_date(&raw.value).map_err(|error| FeedWarning::InvalidDate {
        line: raw.line,
        property,
        value: raw.value.clone(),
        error,
    })
}
