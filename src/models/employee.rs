//! Employee and weekly pattern data models.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// One weekday's shift assignment, e.g. `"8-5 CT"` for 8 hours or `"OFF"` for 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub shift: String,
    pub hours: f64,
}

impl ShiftConfig {
    pub fn new(shift: impl Into<String>, hours: f64) -> Self {
        Self {
            shift: shift.into(),
            hours,
        }
    }

    pub fn off() -> Self {
        Self::new("OFF", 0.0)
    }
}

/// Fixed 7-day shift template. All seven days are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPattern {
    pub monday: ShiftConfig,
    pub tuesday: ShiftConfig,
    pub wednesday: ShiftConfig,
    pub thursday: ShiftConfig,
    pub friday: ShiftConfig,
    pub saturday: ShiftConfig,
    pub sunday: ShiftConfig,
}

impl WeeklyPattern {
    pub fn for_weekday(&self, weekday: Weekday) -> &ShiftConfig {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

impl Default for WeeklyPattern {
    /// Mon-Fri "8-5 CT"/8h, Sat-Sun "OFF"/0h.
    fn default() -> Self {
        Self {
            monday: ShiftConfig::new("8-5 CT", 8.0),
            tuesday: ShiftConfig::new("8-5 CT", 8.0),
            wednesday: ShiftConfig::new("8-5 CT", 8.0),
            thursday: ShiftConfig::new("8-5 CT", 8.0),
            friday: ShiftConfig::new("8-5 CT", 8.0),
            saturday: ShiftConfig::off(),
            sunday: ShiftConfig::off(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub weekly_pattern: WeeklyPattern,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
