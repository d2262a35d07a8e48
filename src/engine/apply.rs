//! Applies an approved deviation to the affected entry or entries.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{ChangePayload, Deviation, Employee, ScheduleEntry};

use super::{pattern::pattern_entry, ScheduleEngine};

impl ScheduleEngine {
    /// Mutates or creates the entries named by `payload` and flags them as
    /// deviated. Entries for other dates are untouched; each touched entry
    /// is persisted immediately.
    ///
    /// Missing entries are synthesized from the pattern before mutation,
    /// for swaps as well as single-day changes.
    pub async fn apply_change(&self, employee_id: &str, payload: &ChangePayload) -> Result<()> {
        let employee = self.require_employee(employee_id).await?;
        let cutoff = self.pattern_cutoff(employee_id).await?;

        match payload {
            ChangePayload::TimeOff { date } => {
                let mut entry = self.entry_or_pattern(&employee, *date, cutoff).await?;
                entry.shift = "OFF".to_string();
                entry.hours = 0.0;
                entry.deviation = Some(Deviation::TimeOff);
                self.store.upsert_entry(employee_id, &entry).await?;
            }
            ChangePayload::CustomHours { date, shift, hours } => {
                let mut entry = self.entry_or_pattern(&employee, *date, cutoff).await?;
                entry.shift = shift.clone();
                entry.hours = *hours;
                entry.deviation = Some(Deviation::CustomHours);
                self.store.upsert_entry(employee_id, &entry).await?;
            }
            ChangePayload::Swap { from, to } => {
                let mut from_entry = self.entry_or_pattern(&employee, *from, cutoff).await?;
                let mut to_entry = self.entry_or_pattern(&employee, *to, cutoff).await?;

                std::mem::swap(&mut from_entry.shift, &mut to_entry.shift);
                std::mem::swap(&mut from_entry.hours, &mut to_entry.hours);
                from_entry.deviation = Some(Deviation::Swapped);
                to_entry.deviation = Some(Deviation::Swapped);

                self.store.upsert_entry(employee_id, &from_entry).await?;
                self.store.upsert_entry(employee_id, &to_entry).await?;
            }
        }

        Ok(())
    }

    /// The persisted entry for `date`, or a fresh pattern-derived one.
    async fn entry_or_pattern(
        &self,
        employee: &Employee,
        date: NaiveDate,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<ScheduleEntry> {
        let entries = self.store.entries(&employee.id).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.date == date)
            .unwrap_or_else(|| pattern_entry(employee, date, cutoff)))
    }
}
