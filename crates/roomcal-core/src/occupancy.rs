//! Per-resource occupancy.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Occupancy of one resource on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayStatus {
    /// Nothing booked. Implied for every day without an entry.
    #[default]
    Free,
    /// Booked or closed.
    Blocked,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Blocked => "BLOCKED",
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse day → status map for one resource.
///
/// Only blocked days are stored; [`OccupancyMap::status`] is the one place
/// where a missing day turns into [`DayStatus::Free`]. Days are kept in
/// calendar order and serialize as `YYYY-MM-DD` keys, so the JSON form of a
/// map is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupancyMap {
    days: BTreeMap<NaiveDate, DayStatus>,
}

impl OccupancyMap {
    /// Creates an empty (fully free) map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a day as blocked. Returns `false` if it already was.
    pub fn block(&mut self, date: NaiveDate) -> bool {
        self.days.insert(date, DayStatus::Blocked) != Some(DayStatus::Blocked)
    }

    /// Returns the status of a day, defaulting to free.
    pub fn status(&self, date: NaiveDate) -> DayStatus {
        self.days.get(&date).copied().unwrap_or_default()
    }

    /// Returns true if the day is blocked.
    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.status(date).is_blocked()
    }

    /// Iterates over blocked days in calendar order.
    pub fn blocked_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days
            .iter()
            .filter(|(_, status)| status.is_blocked())
            .map(|(date, _)| *date)
    }

    /// Number of blocked days.
    pub fn blocked_count(&self) -> usize {
        self.blocked_days().count()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns true if no day is stored.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Extend<NaiveDate> for OccupancyMap {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        for date in iter {
            self.block(date);
        }
    }
}

impl FromIterator<NaiveDate> for OccupancyMap {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_day_is_free() {
        let map = OccupancyMap::new();
        assert_eq!(map.status(date(2024, 6, 10)), DayStatus::Free);
        assert!(!map.is_blocked(date(2024, 6, 10)));
    }

    #[test]
    fn block_is_idempotent() {
        let mut map = OccupancyMap::new();
        assert!(map.block(date(2024, 6, 10)));
        assert!(!map.block(date(2024, 6, 10)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.blocked_count(), 1);
    }

    #[test]
    fn blocked_days_are_sorted() {
        let map: OccupancyMap = [date(2024, 6, 12), date(2024, 6, 1), date(2024, 6, 5)]
            .into_iter()
            .collect();
        let days: Vec<_> = map.blocked_days().collect();
        assert_eq!(days, vec![date(2024, 6, 1), date(2024, 6, 5), date(2024, 6, 12)]);
    }

    #[test]
    fn serializes_as_date_keyed_object() {
        let map: OccupancyMap = [date(2024, 6, 11), date(2024, 6, 10)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2024-06-10":"BLOCKED","2024-06-11":"BLOCKED"}"#);

        let back: OccupancyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn explicit_free_entries_read_as_free() {
        let map: OccupancyMap =
            serde_json::from_str(r#"{"2024-06-10":"FREE","2024-06-11":"BLOCKED"}"#).unwrap();
        assert_eq!(map.status(date(2024, 6, 10)), DayStatus::Free);
        assert_eq!(map.blocked_count(), 1);
    }

    #[test]
    fn status_display() {
        assert_eq!(DayStatus::Blocked.to_string(), "BLOCKED");
        assert_eq!(DayStatus::default(), DayStatus::Free);
    }
}
