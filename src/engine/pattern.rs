//! Pattern expansion: weekly template -> dated entries.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::models::{Employee, ScheduleEntry, ShiftConfig};

/// Derives the entry for `date` from the employee's weekly pattern.
///
/// Dates before the pattern cutoff day are not derivable from the current
/// pattern; they come back as a bare `OFF`/0 placeholder and are expected
/// to be filled from persisted history instead.
pub fn pattern_entry(
    employee: &Employee,
    date: NaiveDate,
    cutoff: Option<DateTime<Utc>>,
) -> ScheduleEntry {
    if let Some(cutoff) = cutoff {
        if date < cutoff.date_naive() {
            return ScheduleEntry {
                date,
                shift: ShiftConfig::off().shift,
                hours: 0.0,
                deviation: None,
            };
        }
    }

    let config = employee.weekly_pattern.for_weekday(date.weekday());
    ScheduleEntry {
        date,
        shift: config.shift.clone(),
        hours: config.hours,
        deviation: None,
    }
}

/// Every calendar date from `as_of` through six months ahead, inclusive.
///
/// The rolling horizon bounds storage growth while keeping future-dated
/// approvals pre-materialized.
pub fn horizon_dates(as_of: NaiveDate) -> Vec<NaiveDate> {
    let end = as_of
        .checked_add_months(Months::new(6))
        .unwrap_or(NaiveDate::MAX);

    as_of.iter_days().take_while(|date| *date <= end).collect()
}
