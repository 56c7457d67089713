//! Free-day listings per department.
//!
//! A listing answers "which nights can still be booked this month?" for every
//! department, grouping consecutive free days into ranges. It uses the same
//! read path as any other consumer: missing days are free, past days are not
//! bookable.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::{CalendarMonth, DayState, MonthView};
use crate::snapshot::Snapshot;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const RULE: &str = "------------------";

/// A bookable unit of the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Key of the department in the snapshot.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Department {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Day numbers of `month` that are neither past nor blocked.
pub fn free_days(
    snapshot: &Snapshot,
    resource: &str,
    month: CalendarMonth,
    today: NaiveDate,
) -> Vec<u32> {
    MonthView::new(snapshot, resource, month, today).days_in_state(DayState::Free)
}

/// Groups sorted day numbers into runs of consecutive days.
pub fn group_ranges(days: &[u32]) -> Vec<RangeInclusive<u32>> {
    let mut ranges: Vec<RangeInclusive<u32>> = Vec::new();
    for &day in days {
        match ranges.last_mut() {
            Some(last) if last.end() + 1 == day => *last = *last.start()..=day,
            _ => ranges.push(day..=day),
        }
    }
    ranges
}

/// One department's line in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub department: Department,
    pub free_days: Vec<u32>,
}

impl ListingEntry {
    pub fn ranges(&self) -> Vec<RangeInclusive<u32>> {
        group_ranges(&self.free_days)
    }

    /// Spanish summary of the free ranges, e.g. `del 1 al 5 y el 20`.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self.ranges().iter().map(describe_range).collect();
        match parts.split_last() {
            None => "Sin días libres para reservar (completo o fechas ya pasadas)".to_string(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} y {}", rest.join(", "), last),
        }
    }
}

fn describe_range(range: &RangeInclusive<u32>) -> String {
    if range.start() == range.end() {
        format!("el {}", range.start())
    } else {
        format!("del {} al {}", range.start(), range.end())
    }
}

/// Free days of every department for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyListing {
    pub month: CalendarMonth,
    pub entries: Vec<ListingEntry>,
}

impl MonthlyListing {
    /// Builds the listing in department order.
    pub fn build(
        snapshot: &Snapshot,
        departments: &[Department],
        month: CalendarMonth,
        today: NaiveDate,
    ) -> Self {
        let entries = departments
            .iter()
            .map(|department| ListingEntry {
                free_days: free_days(snapshot, &department.id, month, today),
                department: department.clone(),
            })
            .collect();
        Self { month, entries }
    }

    /// Month name and year, e.g. `junio de 2024`.
    pub fn month_label(&self) -> String {
        let name = MONTH_NAMES[self.month.month() as usize - 1];
        format!("{} de {}", name, self.month.year())
    }
}

impl fmt::Display for MonthlyListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Disponibilidad: {}", self.month_label())?;
        for entry in &self.entries {
            writeln!(f)?;
            writeln!(f, "{}", entry.department.name.to_uppercase())?;
            writeln!(f, "{RULE}")?;
            writeln!(f, "• {}", entry.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::OccupancyMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june() -> CalendarMonth {
        CalendarMonth::new(2024, 6).unwrap()
    }

    fn snapshot() -> Snapshot {
        let dept1: OccupancyMap = [date(2024, 6, 12), date(2024, 6, 13), date(2024, 6, 20)]
            .into_iter()
            .collect();
        let dept2: OccupancyMap = june().days().collect();
        Snapshot::new().merge([("dept-1", dept1), ("dept-2", dept2)])
    }

    #[test]
    fn group_consecutive_days() {
        assert_eq!(group_ranges(&[]), Vec::<RangeInclusive<u32>>::new());
        assert_eq!(group_ranges(&[1, 2, 3, 5, 7, 8]), vec![1..=3, 5..=5, 7..=8]);
    }

    #[test]
    fn free_days_skip_past_and_blocked() {
        let days = free_days(&snapshot(), "dept-1", june(), date(2024, 6, 10));
        assert_eq!(days.first(), Some(&10));
        assert!(!days.contains(&12));
        assert!(!days.contains(&20));
        assert_eq!(days.len(), 21 - 3);
    }

    #[test]
    fn unknown_department_is_entirely_free() {
        let days = free_days(&snapshot(), "dept-9", june(), date(2024, 5, 1));
        assert_eq!(days, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn summary_phrasing() {
        let entry = |free_days: Vec<u32>| ListingEntry {
            department: Department::new("d", "D"),
            free_days,
        };
        assert_eq!(entry(vec![20]).summary(), "el 20");
        assert_eq!(entry(vec![1, 2, 3, 4, 5, 20]).summary(), "del 1 al 5 y el 20");
        assert_eq!(
            entry(vec![1, 3, 4, 9]).summary(),
            "el 1, del 3 al 4 y el 9"
        );
    }

    #[test]
    fn render_listing() {
        let departments = [
            Department::new("dept-1", "Departamento 1"),
            Department::new("dept-2", "Departamento 2"),
        ];
        let listing = MonthlyListing::build(&snapshot(), &departments, june(), date(2024, 6, 10));

        assert_eq!(
            listing.to_string(),
            "Disponibilidad: junio de 2024\n\
             \n\
             DEPARTAMENTO 1\n\
             ------------------\n\
             • del 10 al 11, del 14 al 19 y del 21 al 30\n\
             \n\
             DEPARTAMENTO 2\n\
             ------------------\n\
             • Sin días libres para reservar (completo o fechas ya pasadas)\n"
        );
    }
}
