//! Core types: feed transducer, occupancy, snapshots, month listings

pub mod ics;
pub mod listing;
pub mod month;
pub mod occupancy;
pub mod snapshot;
pub mod tracing;

pub use ics::{
    DateError, DateProperty, EventBlock, FeedParse, FeedWarning, canonical_date,
    normalize_date, parse_feed,
};
pub use listing::{Department, ListingEntry, MonthlyListing, free_days, group_ranges};
pub use month::{CalendarMonth, DayState, MonthParseError, MonthView, day_state};
pub use occupancy::{DayStatus, OccupancyMap};
pub use snapshot::{FailurePolicy, FeedOutcome, MergeReport, Snapshot, SyncBatch};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
