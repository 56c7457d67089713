//! Event block extraction.
//!
//! Only four kinds of lines matter here: the `BEGIN:VEVENT` / `END:VEVENT`
//! markers and the `DTSTART` / `DTEND` properties inside a block. Everything
//! else, including nested components such as `VALARM`, is treated as opaque.

use super::FeedWarning;

const EVENT_BEGIN: &str = "BEGIN:VEVENT";
const EVENT_END: &str = "END:VEVENT";
const START_PROPERTY: &str = "DTSTART";
const END_PROPERTY: &str = "DTEND";

/// A property value together with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    /// Everything after the first colon of the line.
    pub value: String,
    /// 1-based line number.
    pub line: usize,
}

/// One closed `VEVENT` block with a start.
///
/// Blocks without an end are single-day events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBlock {
    /// Line of the `BEGIN:VEVENT` marker.
    pub begin_line: usize,
    /// Raw `DTSTART` value.
    pub start: RawProperty,
    /// Raw `DTEND` value, if the block had one.
    pub end: Option<RawProperty>,
}

/// Blocks and anomalies found while scanning a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub events: Vec<EventBlock>,
    pub warnings: Vec<FeedWarning>,
}

#[derive(Debug)]
struct OpenEvent {
    begin_line: usize,
    start: Option<RawProperty>,
    end: Option<RawProperty>,
}

/// Line-at-a-time scanner for event blocks.
#[derive(Debug, Default)]
pub struct EventExtractor {
    current: Option<OpenEvent>,
    output: Extraction,
}

impl EventExtractor {
    /// Creates an extractor outside of any event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line, numbered from 1.
    pub fn push_line(&mut self, line_no: usize, line: &str) {
        if line.starts_with(EVENT_BEGIN) {
            if self.current.is_some() {
                self.output
                    .warnings
                    .push(FeedWarning::NestedEvent { line: line_no });
            }
            self.current = Some(OpenEvent {
                begin_line: line_no,
                start: None,
                end: None,
            });
        } else if line.starts_with(EVENT_END) {
            match self.current.take() {
                Some(open) => self.close(open),
                None => self
                    .output
                    .warnings
                    .push(FeedWarning::StrayEventEnd { line: line_no }),
            }
        } else if let Some(open) = self.current.as_mut() {
            // Prefix match: accepts `DTSTART;VALUE=DATE:` as well as `DTSTART:`.
            if line.starts_with(START_PROPERTY) {
                open.start = property_value(line, line_no);
            }
            if line.starts_with(END_PROPERTY) {
                open.end = property_value(line, line_no);
            }
        }
    }

    /// Ends the scan. An event still open at this point is dropped.
    pub fn finish(mut self) -> Extraction {
        if let Some(open) = self.current.take() {
            self.output.warnings.push(FeedWarning::UnterminatedEvent {
                line: open.begin_line,
            });
        }
        self.output
    }

    fn close(&mut self, open: OpenEvent) {
        match open.start {
            Some(start) => self.output.events.push(EventBlock {
                begin_line: open.begin_line,
                start,
                end: open.end,
            }),
            None => self.output.warnings.push(FeedWarning::MissingStart {
                line: open.begin_line,
            }),
        }
    }
}

/// Scans lines for event blocks.
pub fn extract_events<'a>(lines: impl IntoIterator<Item = &'a str>) -> Extraction {
    let mut extractor = EventExtractor::new();
    for (idx, line) in lines.into_iter().enumerate() {
        extractor.push_line(idx + 1, line);
    }
    extractor.finish()
}

/// Returns everything after the first colon; an empty value counts as absent.
fn property_value(line: &str, line_no: usize) -> Option<RawProperty> {
    line.split_once(':')
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .map(|value| RawProperty {
            value: value.to_string(),
            line: line_no,
        })
}
