//! Calendar months and the display state of each day.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::occupancy::DayStatus;
use crate::snapshot::Snapshot;

/// Error returned when parsing a `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid month {input:?}, expected YYYY-MM")]
pub struct MonthParseError {
    input: String,
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    first: NaiveDate,
}

impl CalendarMonth {
    /// Returns the month, or `None` if `month` is not in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Returns the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Iterates over every day of the month.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month();
        self.first.iter_days().take_while(move |d| d.month() == month)
    }

    /// Number of days in the month.
    pub fn day_count(&self) -> u32 {
        self.days().count() as u32
    }

    /// Number of blank cells before day 1 in a Monday-first week grid.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_monday()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for CalendarMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthParseError {
            input: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

/// How a day is shown to someone looking for a free night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    /// Before today; cannot be booked whatever the feed says.
    Past,
    Free,
    Blocked,
}

impl From<DayStatus> for DayState {
    fn from(status: DayStatus) -> Self {
        match status {
            DayStatus::Free => Self::Free,
            DayStatus::Blocked => Self::Blocked,
        }
    }
}

/// Returns the display state of `resource` on `date`.
///
/// Days strictly before `today` are [`DayState::Past`]; this is computed at
/// read time and never stored in the snapshot.
pub fn day_state(snapshot: &Snapshot, resource: &str, date: NaiveDate, today: NaiveDate) -> DayState {
    if date < today {
        DayState::Past
    } else {
        snapshot.status(resource, date).into()
    }
}

/// One resource's month, day by day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub month: CalendarMonth,
    pub days: Vec<(NaiveDate, DayState)>,
}

impl MonthView {
    pub fn new(snapshot: &Snapshot, resource: &str, month: CalendarMonth, today: NaiveDate) -> Self {
        let days = month
            .days()
            .map(|date| (date, day_state(snapshot, resource, date, today)))
            .collect();
        Self { month, days }
    }

    /// Day-of-month numbers in the given state.
    pub fn days_in_state(&self, state: DayState) -> Vec<u32> {
        self.days
            .iter()
            .filter(|(_, s)| *s == state)
            .map(|(date, _)| date.day())
            .collect()
    }
}
