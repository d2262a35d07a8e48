//! Concrete per-day schedule records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why an entry differs from its pattern-derived default.
///
/// Storing one optional kind instead of three booleans makes the
/// "at most one deviation per entry" invariant structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    Swapped,
    TimeOff,
    CustomHours,
}

impl Deviation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deviation::Swapped => "swapped",
            Deviation::TimeOff => "time_off",
            Deviation::CustomHours => "custom_hours",
        }
    }
}

/// One employee's schedule record for one calendar date.
///
/// An entry without a deviation is pattern-derived and safe to regenerate;
/// a deviated entry must survive reconciliation until explicitly reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub shift: String,
    pub hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<Deviation>,
}

impl ScheduleEntry {
    pub fn is_deviated(&self) -> bool {
        self.deviation.is_some()
    }
}
