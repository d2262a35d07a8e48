use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Deviation, RequestStatus, TeamChangeKind};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_deviation(value: Option<String>) -> Result<Option<Deviation>> {
    match value.as_deref() {
        None => Ok(None),
        Some("swapped") => Ok(Some(Deviation::Swapped)),
        Some("time_off") => Ok(Some(Deviation::TimeOff)),
        Some("custom_hours") => Ok(Some(Deviation::CustomHours)),
        Some(other) => Err(anyhow!("unknown deviation kind {other}")),
    }
}

pub fn parse_status(value: &str) -> Result<RequestStatus> {
    match value {
        "pending" => Ok(RequestStatus::Pending),
        "approved" => Ok(RequestStatus::Approved),
        "rejected" => Ok(RequestStatus::Rejected),
        other => Err(anyhow!("unknown request status {other}")),
    }
}

pub fn parse_team_change_kind(value: &str) -> Result<TeamChangeKind> {
    match value {
        "employee_added" => Ok(TeamChangeKind::EmployeeAdded),
        "employee_updated" => Ok(TeamChangeKind::EmployeeUpdated),
        "employee_removed" => Ok(TeamChangeKind::EmployeeRemoved),
        "schedule_pattern_changed" => Ok(TeamChangeKind::SchedulePatternChanged),
        other => Err(anyhow!("unknown team change kind {other}")),
    }
}
