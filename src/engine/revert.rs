//! Restores deviated entries to their pattern-derived values.

use anyhow::Result;
use chrono::NaiveDate;
use log::warn;

use crate::models::{ChangePayload, Deviation, RequestStatus, RequestUpdate};

use super::{pattern::pattern_entry, ScheduleEngine};

impl ScheduleEngine {
    /// Reverts the entry at `date` to its pattern-derived value and flips
    /// the originating approved request to rejected.
    ///
    /// A swap reverts both sides of the pair. When the entry carries a flag
    /// but no matching ledger record exists, only the requested date is
    /// regenerated. Entries without a deviation are left alone.
    pub async fn revert_change(&self, employee_id: &str, date: NaiveDate) -> Result<()> {
        let employee = self.require_employee(employee_id).await?;

        let entries = self.store.entries(employee_id).await?;
        let Some(entry) = entries.iter().find(|entry| entry.date == date) else {
            return Ok(());
        };
        let Some(deviation) = entry.deviation else {
            return Ok(());
        };

        let cutoff = self.pattern_cutoff(employee_id).await?;

        match deviation {
            Deviation::Swapped => {
                let requests = self.store.requests().await?;
                let swap = requests.iter().find(|req| {
                    req.employee_id == employee_id
                        && req.status == RequestStatus::Approved
                        && req.payload.covers_swap_date(date)
                });

                match swap {
                    Some(request) => {
                        if let ChangePayload::Swap { from, to } = &request.payload {
                            let from_entry = pattern_entry(&employee, *from, cutoff);
                            let to_entry = pattern_entry(&employee, *to, cutoff);
                            self.store.upsert_entry(employee_id, &from_entry).await?;
                            self.store.upsert_entry(employee_id, &to_entry).await?;
                            self.store
                                .update_request(
                                    &request.id,
                                    &RequestUpdate::status(RequestStatus::Rejected),
                                )
                                .await?;
                        }
                    }
                    None => {
                        warn!(
                            "No approved swap request covers {date} for employee {employee_id}; \
                             reverting the single date"
                        );
                        let restored = pattern_entry(&employee, date, cutoff);
                        self.store.upsert_entry(employee_id, &restored).await?;
                    }
                }
            }
            Deviation::TimeOff | Deviation::CustomHours => {
                let restored = pattern_entry(&employee, date, cutoff);
                self.store.upsert_entry(employee_id, &restored).await?;

                let requests = self.store.requests().await?;
                let originating = requests.iter().find(|req| {
                    req.employee_id == employee_id
                        && req.status == RequestStatus::Approved
                        && match (&req.payload, deviation) {
                            (ChangePayload::TimeOff { date: d }, Deviation::TimeOff) => *d == date,
                            (ChangePayload::CustomHours { date: d, .. }, Deviation::CustomHours) => {
                                *d == date
                            }
                            _ => false,
                        }
                });

                match originating {
                    Some(request) => {
                        self.store
                            .update_request(
                                &request.id,
                                &RequestUpdate::status(RequestStatus::Rejected),
                            )
                            .await?;
                    }
                    None => {
                        warn!(
                            "No approved {} request found for {date} on employee {employee_id}",
                            deviation.as_str()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
