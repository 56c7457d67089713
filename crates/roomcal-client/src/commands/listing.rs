//! Listing command: free days per department from the stored snapshot.

use chrono::{Local, NaiveDate};
use roomcal_core::{CalendarMonth, Department, MonthlyListing, Snapshot};
use roomcal_server::SnapshotStore;

use crate::config::RoomcalConfig;
use crate::error::ClientResult;

pub fn run(config: &RoomcalConfig, month: Option<CalendarMonth>) -> ClientResult<()> {
    let snapshot = config.store()?.load()?;
    let today = Local::now().date_naive();
    print!("{}", render(config, &snapshot, month, today));
    Ok(())
}

/// Builds the listing text.
///
/// Without configured departments, every resource in the snapshot is
/// listed under its id.
pub fn render(
    config: &RoomcalConfig,
    snapshot: &Snapshot,
    month: Option<CalendarMonth>,
    today: NaiveDate,
) -> String {
    let month = month.unwrap_or_else(|| CalendarMonth::containing(today));
    let mut departments = config.departments();
    if departments.is_empty() {
        departments = snapshot
            .resource_ids()
            .map(|id| Department::new(id, id))
            .collect();
    }
    MonthlyListing::build(snapshot, &departments, month, today).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcal_core::OccupancyMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> Snapshot {
        let blocked: OccupancyMap = (1..=15).map(|d| date(2024, 6, d)).collect();
        Snapshot::new().merge([("dept-1", blocked)])
    }

    #[test]
    fn falls_back_to_snapshot_resources() {
        let text = render(
            &RoomcalConfig::default(),
            &snapshot(),
            None,
            date(2024, 6, 3),
        );
        assert_eq!(
            text,
            "Disponibilidad: junio de 2024\n\nDEPT-1\n------------------\n• del 16 al 30\n"
        );
    }

    #[test]
    fn configured_departments_in_order() {
        let config = RoomcalConfig::parse(
            "[[departments]]\nid = \"dept-2\"\nname = \"Departamento 2\"\nfeed = \"b.ics\"\n\n\
             [[departments]]\nid = \"dept-1\"\nname = \"Departamento 1\"\nfeed = \"a.ics\"\n",
        )
        .unwrap();
        let text = render(
            &config,
            &snapshot(),
            CalendarMonth::new(2024, 7),
            date(2024, 6, 3),
        );
        let second = text.find("DEPARTAMENTO 1").unwrap();
        let first = text.find("DEPARTAMENTO 2").unwrap();
        assert!(first < second);
        assert!(text.starts_with("Disponibilidad: julio de 2024\n"));
        assert_eq!(text.matches("• del 1 al 31").count(), 2);
    }
}
