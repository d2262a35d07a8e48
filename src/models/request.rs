//! Schedule change requests and their approval lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The deviation a request asks for. A swap always carries both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangePayload {
    TimeOff {
        date: NaiveDate,
    },
    CustomHours {
        date: NaiveDate,
        shift: String,
        hours: f64,
    },
    Swap {
        from: NaiveDate,
        to: NaiveDate,
    },
}

impl ChangePayload {
    /// The primary date of the request (the `from` side for swaps).
    pub fn date(&self) -> NaiveDate {
        match self {
            ChangePayload::TimeOff { date } => *date,
            ChangePayload::CustomHours { date, .. } => *date,
            ChangePayload::Swap { from, .. } => *from,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            ChangePayload::TimeOff { .. } => "time_off",
            ChangePayload::CustomHours { .. } => "custom_hours",
            ChangePayload::Swap { .. } => "swap",
        }
    }

    /// True for swaps whose pair includes `date`.
    pub fn covers_swap_date(&self, date: NaiveDate) -> bool {
        matches!(self, ChangePayload::Swap { from, to } if *from == date || *to == date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    /// Also used when an approved change is later reverted; the ledger is an
    /// audit trail, not a strict state machine.
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// One ledger record. Never deleted, only status-transitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: String,
    pub employee_id: String,
    #[serde(flatten)]
    pub payload: ChangePayload,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// Partial update applied to a ledger record; absent fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
    pub status: Option<RequestStatus>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl RequestUpdate {
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn resolution(
        status: RequestStatus,
        approved_by: &str,
        approved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: Some(status),
            approved_by: Some(approved_by.to_string()),
            approved_at: Some(approved_at),
        }
    }
}
