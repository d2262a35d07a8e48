//! Append-only audit log of team-level changes.
//!
//! `EmployeeAdded` and `SchedulePatternChanged` records are load-bearing:
//! their timestamp is the pattern cutoff used by the pattern expander.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamChangeKind {
    EmployeeAdded,
    EmployeeUpdated,
    EmployeeRemoved,
    SchedulePatternChanged,
}

impl TeamChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamChangeKind::EmployeeAdded => "employee_added",
            TeamChangeKind::EmployeeUpdated => "employee_updated",
            TeamChangeKind::EmployeeRemoved => "employee_removed",
            TeamChangeKind::SchedulePatternChanged => "schedule_pattern_changed",
        }
    }

    /// Whether this record moves the employee's pattern cutoff.
    pub fn affects_pattern(&self) -> bool {
        matches!(
            self,
            TeamChangeKind::EmployeeAdded | TeamChangeKind::SchedulePatternChanged
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChange {
    pub id: String,
    pub kind: TeamChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}
