//! Date normalization and day-range expansion for feed property values.

use chrono::NaiveDate;
use thiserror::Error;

/// Number of digits in a `YYYYMMDD` payload.
const DATE_DIGITS: usize = 8;

/// Why a property value could not be turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The date portion did not contain exactly eight digits.
    #[error("expected 8 digits, found {0}")]
    DigitCount(usize),

    /// Eight digits were present but they do not name a real day.
    #[error("{0} is not a calendar date")]
    NotACalendarDate(String),
}

/// Normalizes a raw `DTSTART`/`DTEND` value into a calendar date.
///
/// Accepts `YYYYMMDD` and `YYYYMMDDTHHMMSS[Z]`. Everything from the first `T`
/// on is discarded, as is every non-digit character before it, so
/// `2024-06-10` is accepted too. The time of day and any zone indicator are
/// ignored on purpose: occupancy is tracked per night, not per instant.
///
/// # Errors
///
/// Returns [`DateError::DigitCount`] unless exactly eight digits remain, and
/// [`DateError::NotACalendarDate`] for impossible dates such as `20231301`.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DateError> {
    let date_part = raw.split('T').next().unwrap_or_default();
    let digits: String = date_part.chars().filter(char::is_ascii_digit).collect();

    if digits.len() != DATE_DIGITS {
        return Err(DateError::DigitCount(digits.len()));
    }

    let (year, rest) = digits.split_at(4);
    let (month, day) = rest.split_at(2);

    match (year.parse(), month.parse(), day.parse()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| DateError::NotACalendarDate(format!("{year}-{month}-{day}"))),
        _ => Err(DateError::NotACalendarDate(digits)),
    }
}

/// Formats a date in canonical `YYYY-MM-DD` form.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Yields every day in `[start, end)`.
///
/// The end date is the departure morning and is never included. Nothing is
/// yielded unless `end` is strictly after `start`. Advancing is done on
/// calendar dates only, so there is no time-of-day or offset drift.
pub fn expand_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_date_only() {
        assert_eq!(normalize_date("20240610"), Ok(date(2024, 6, 10)));
    }

    #[test]
    fn normalize_date_time_matches_date_only() {
        for raw in ["20240610", "20231231", "20240229", "19991101"] {
            assert_eq!(
                normalize_date(raw),
                normalize_date(&format!("{raw}T000000Z")),
                "{raw}"
            );
        }
    }

    #[test]
    fn normalize_discards_time_and_zone() {
        assert_eq!(normalize_date("20240610T235959Z"), Ok(date(2024, 6, 10)));
        assert_eq!(normalize_date("20240610T120000"), Ok(date(2024, 6, 10)));
    }

    #[test]
    fn normalize_strips_non_digits() {
        assert_eq!(normalize_date("2024-06-10"), Ok(date(2024, 6, 10)));
        assert_eq!(normalize_date(" 20240610 "), Ok(date(2024, 6, 10)));
    }

    #[test]
    fn normalize_rejects_wrong_digit_count() {
        assert_eq!(normalize_date(""), Err(DateError::DigitCount(0)));
        assert_eq!(normalize_date("2024061"), Err(DateError::DigitCount(7)));
        assert_eq!(normalize_date("202406100"), Err(DateError::DigitCount(9)));
    }

    #[test]
    fn normalize_rejects_impossible_dates() {
        assert!(matches!(
            normalize_date("20231301"),
            Err(DateError::NotACalendarDate(_))
        ));
        assert!(matches!(
            normalize_date("20230229"),
            Err(DateError::NotACalendarDate(_))
        ));
    }

    #[test]
    fn canonical_form() {
        assert_eq!(canonical_date(date(2024, 6, 1)), "2024-06-01");
    }

    #[test]
    fn expand_excludes_end() {
        let days: Vec<_> = expand_range(date(2024, 6, 10), date(2024, 6, 13)).collect();
        assert_eq!(
            days,
            vec![date(2024, 6, 10), date(2024, 6, 11), date(2024, 6, 12)]
        );
    }

    #[test]
    fn expand_one_night() {
        let days: Vec<_> = expand_range(date(2024, 6, 10), date(2024, 6, 11)).collect();
        assert_eq!(days, vec![date(2024, 6, 10)]);
    }

    #[test]
    fn expand_empty_when_end_not_after_start() {
        assert_eq!(expand_range(date(2024, 6, 10), date(2024, 6, 10)).count(), 0);
        assert_eq!(expand_range(date(2024, 6, 10), date(2024, 6, 1)).count(), 0);
    }

    #[test]
    fn expand_crosses_month_and_year_boundaries() {
        let days: Vec<_> = expand_range(date(2023, 12, 30), date(2024, 1, 2)).collect();
        assert_eq!(
            days,
            vec![date(2023, 12, 30), date(2023, 12, 31), date(2024, 1, 1)]
        );
    }

    #[test]
    fn expand_across_dst_change() {
        // Last Sunday of March: clocks move in most of Europe.
        let days: Vec<_> = expand_range(date(2024, 3, 30), date(2024, 4, 1)).collect();
        assert_eq!(days, vec![date(2024, 3, 30), date(2024, 3, 31)]);
    }
}
