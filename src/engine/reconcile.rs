//! Full-horizon reconciliation: merges pattern defaults, persisted history,
//! and approved deviations into the authoritative entry set.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use crate::models::{
    ChangePayload, ChangeRequest, Deviation, Employee, RequestStatus, ScheduleEntry,
};

use super::{
    pattern::{horizon_dates, pattern_entry},
    ScheduleEngine,
};

/// Exchange shift/hours between the two sides of a swap and mark both.
fn exchange(a: &mut ScheduleEntry, b: &mut ScheduleEntry) {
    std::mem::swap(&mut a.shift, &mut b.shift);
    std::mem::swap(&mut a.hours, &mut b.hours);
    a.deviation = Some(Deviation::Swapped);
    b.deviation = Some(Deviation::Swapped);
}

/// Pure merge pass over one employee's horizon.
///
/// Swap pairs are resolved before the per-date loop: a swap mutates two
/// entries jointly, and resolving it up front keeps the single-date logic
/// from overwriting one side. A pair whose persisted entries both carry the
/// swapped flag was already exchanged by the applier or a prior pass and is
/// kept as-is, so re-running the merge never toggles a swap back.
pub(crate) fn merge_horizon(
    employee: &Employee,
    dates: &[NaiveDate],
    persisted: Vec<ScheduleEntry>,
    approved: &[ChangeRequest],
    cutoff: Option<DateTime<Utc>>,
    as_of: NaiveDate,
) -> Vec<ScheduleEntry> {
    let mut current: HashMap<NaiveDate, ScheduleEntry> = persisted
        .into_iter()
        .map(|entry| (entry.date, entry))
        .collect();

    let mut deviations: HashMap<NaiveDate, &ChangePayload> = HashMap::new();
    let mut swap_pairs: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    for request in approved {
        match &request.payload {
            ChangePayload::TimeOff { date } | ChangePayload::CustomHours { date, .. } => {
                deviations.insert(*date, &request.payload);
            }
            ChangePayload::Swap { from, to } => {
                deviations.insert(*from, &request.payload);
                deviations.insert(*to, &request.payload);
                swap_pairs.push((*from, *to));
            }
        }
    }

    for (from, to) in swap_pairs {
        let from_existing = current.remove(&from);
        let to_existing = current.remove(&to);
        let already_swapped = matches!(
            (&from_existing, &to_existing),
            (Some(a), Some(b))
                if a.deviation == Some(Deviation::Swapped)
                    && b.deviation == Some(Deviation::Swapped)
        );

        let mut from_entry =
            from_existing.unwrap_or_else(|| pattern_entry(employee, from, cutoff));
        let mut to_entry = to_existing.unwrap_or_else(|| pattern_entry(employee, to, cutoff));
        if !already_swapped {
            exchange(&mut from_entry, &mut to_entry);
        }
        current.insert(from, from_entry);
        current.insert(to, to_entry);
    }

    let mut entries = Vec::with_capacity(dates.len());
    for &date in dates {
        let deviation = deviations.get(&date).copied();
        let preserve = current
            .get(&date)
            .filter(|entry| date < as_of || entry.is_deviated() || deviation.is_some());

        if let Some(existing) = preserve {
            // Never regress a past or deviated entry back to the pattern;
            // overlay an approved single-day change if one exists.
            let mut entry = existing.clone();
            match deviation {
                Some(ChangePayload::TimeOff { .. }) => {
                    entry.shift = "OFF".to_string();
                    entry.hours = 0.0;
                    entry.deviation = Some(Deviation::TimeOff);
                }
                Some(ChangePayload::CustomHours { shift, hours, .. }) => {
                    entry.shift = shift.clone();
                    entry.hours = *hours;
                    entry.deviation = Some(Deviation::CustomHours);
                }
                _ => {}
            }
            entries.push(entry);
        } else {
            match deviation {
                Some(ChangePayload::TimeOff { .. }) => entries.push(ScheduleEntry {
                    date,
                    shift: "OFF".to_string(),
                    hours: 0.0,
                    deviation: Some(Deviation::TimeOff),
                }),
                Some(ChangePayload::CustomHours { shift, hours, .. }) => {
                    entries.push(ScheduleEntry {
                        date,
                        shift: shift.clone(),
                        hours: *hours,
                        deviation: Some(Deviation::CustomHours),
                    })
                }
                _ => entries.push(pattern_entry(employee, date, cutoff)),
            }
        }
    }

    entries
}

impl ScheduleEngine {
    /// Recomputes and persists the employee's authoritative entry set over
    /// the rolling horizon starting at `as_of`.
    pub async fn reconcile_employee(
        &self,
        employee: &Employee,
        as_of: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>> {
        let dates = horizon_dates(as_of);
        let persisted = self.store.entries(&employee.id).await?;
        let approved: Vec<ChangeRequest> = self
            .store
            .requests()
            .await?
            .into_iter()
            .filter(|req| {
                req.employee_id == employee.id && req.status == RequestStatus::Approved
            })
            .collect();
        let cutoff = self.pattern_cutoff(&employee.id).await?;

        let entries = merge_horizon(employee, &dates, persisted, &approved, cutoff, as_of);
        self.store.replace_entries(&employee.id, &entries).await?;

        info!(
            "Reconciled {} entries for employee {} ({} approved requests)",
            entries.len(),
            employee.id,
            approved.len()
        );

        Ok(entries)
    }

    /// Reconciles every employee over the same horizon.
    pub async fn reconcile_all(&self, as_of: NaiveDate) -> Result<()> {
        for employee in self.store.list_employees().await? {
            self.reconcile_employee(&employee, as_of).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::WeeklyPattern;

    use super::*;

    fn employee() -> Employee {
        Employee {
            id: "emp-1".to_string(),
            name: "Sam".to_string(),
            weekly_pattern: WeeklyPattern::default(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn approved(payload: ChangePayload) -> ChangeRequest {
        ChangeRequest {
            id: "req-1".to_string(),
            employee_id: "emp-1".to_string(),
            payload,
            status: RequestStatus::Approved,
            requested_at: Utc::now(),
            approved_by: Some("admin".to_string()),
            approved_at: Some(Utc::now()),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn swap_with_no_persisted_entries_synthesizes_both_sides() {
        // 2026-03-02 Monday, 2026-03-07 Saturday.
        let requests = vec![approved(ChangePayload::Swap {
            from: date(2),
            to: date(7),
        })];
        let dates: Vec<NaiveDate> = (1..=7).map(date).collect();

        let entries = merge_horizon(&employee(), &dates, Vec::new(), &requests, None, date(1));

        let monday = entries.iter().find(|e| e.date == date(2)).unwrap();
        let saturday = entries.iter().find(|e| e.date == date(7)).unwrap();
        assert_eq!(monday.shift, "OFF");
        assert_eq!(monday.deviation, Some(Deviation::Swapped));
        assert_eq!(saturday.shift, "8-5 CT");
        assert_eq!(saturday.hours, 8.0);
        assert_eq!(saturday.deviation, Some(Deviation::Swapped));
    }

    #[test]
    fn an_already_exchanged_pair_passes_through_unchanged() {
        // Both sides were persisted by the applier; the merge must keep
        // them rather than exchanging them back.
        let persisted = vec![
            ScheduleEntry {
                date: date(2),
                shift: "OFF".to_string(),
                hours: 0.0,
                deviation: Some(Deviation::Swapped),
            },
            ScheduleEntry {
                date: date(7),
                shift: "8-5 CT".to_string(),
                hours: 8.0,
                deviation: Some(Deviation::Swapped),
            },
        ];
        let requests = vec![approved(ChangePayload::Swap {
            from: date(2),
            to: date(7),
        })];
        let dates: Vec<NaiveDate> = (1..=7).map(date).collect();

        let entries = merge_horizon(
            &employee(),
            &dates,
            persisted.clone(),
            &requests,
            None,
            date(1),
        );

        let monday = entries.iter().find(|e| e.date == date(2)).unwrap();
        let saturday = entries.iter().find(|e| e.date == date(7)).unwrap();
        assert_eq!(monday, &persisted[0]);
        assert_eq!(saturday, &persisted[1]);
    }

    #[test]
    fn past_entries_are_kept_verbatim() {
        let past = ScheduleEntry {
            date: date(1),
            shift: "COVERED BY TEMP".to_string(),
            hours: 4.0,
            deviation: None,
        };
        let dates: Vec<NaiveDate> = (1..=3).map(date).collect();

        let entries = merge_horizon(
            &employee(),
            &dates,
            vec![past.clone()],
            &[],
            None,
            date(3),
        );

        assert_eq!(entries[0], past);
    }

    #[test]
    fn approved_change_overlays_a_preserved_entry() {
        // A persisted time-off entry whose request was superseded by an
        // approved custom-hours request for the same day.
        let persisted = vec![ScheduleEntry {
            date: date(4),
            shift: "OFF".to_string(),
            hours: 0.0,
            deviation: Some(Deviation::TimeOff),
        }];
        let requests = vec![approved(ChangePayload::CustomHours {
            date: date(4),
            shift: "11-8 CT".to_string(),
            hours: 8.0,
        })];
        let dates = vec![date(4)];

        let entries = merge_horizon(&employee(), &dates, persisted, &requests, None, date(1));

        assert_eq!(entries[0].shift, "11-8 CT");
        assert_eq!(entries[0].hours, 8.0);
        assert_eq!(entries[0].deviation, Some(Deviation::CustomHours));
    }

    #[test]
    fn fresh_time_off_is_emitted_without_a_persisted_entry() {
        let requests = vec![approved(ChangePayload::TimeOff { date: date(4) })];
        let dates = vec![date(4)];

        let entries = merge_horizon(&employee(), &dates, Vec::new(), &requests, None, date(1));

        assert_eq!(entries[0].shift, "OFF");
        assert_eq!(entries[0].hours, 0.0);
        assert_eq!(entries[0].deviation, Some(Deviation::TimeOff));
    }
}
