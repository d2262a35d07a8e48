//! End-to-end engine behavior against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use shiftboard::{
    models::{ChangePayload, Deviation, Employee, RequestStatus, ShiftConfig, WeeklyPattern},
    MemoryStore, ScheduleEngine, ScheduleStore,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A Friday well before the horizon used by the tests.
fn hired_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 20, 8, 0, 0).unwrap()
}

/// 2026-03-01 is a Sunday.
fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn engine_with_employee() -> (ScheduleEngine, Employee) {
    init_logs();
    let engine = ScheduleEngine::new(Arc::new(MemoryStore::new()));
    let employee = engine
        .add_employee("Jordan", None, hired_at())
        .await
        .unwrap();
    (engine, employee)
}

async fn entry_for(
    engine: &ScheduleEngine,
    employee_id: &str,
    date: NaiveDate,
) -> shiftboard::models::ScheduleEntry {
    engine
        .store()
        .entries(employee_id)
        .await
        .unwrap()
        .into_iter()
        .find(|entry| entry.date == date)
        .unwrap_or_else(|| panic!("no entry for {date}"))
}

#[tokio::test]
async fn default_pattern_fills_two_week_window() {
    let (engine, employee) = engine_with_employee().await;

    let entries = engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let first_two_weeks = &entries[..14];

    assert_eq!(first_two_weeks[0].date, as_of());
    for entry in first_two_weeks {
        let weekend = matches!(entry.date.weekday(), Weekday::Sat | Weekday::Sun);
        if weekend {
            assert_eq!(entry.shift, "OFF", "weekend {}", entry.date);
            assert_eq!(entry.hours, 0.0);
        } else {
            assert_eq!(entry.shift, "8-5 CT", "weekday {}", entry.date);
            assert_eq!(entry.hours, 8.0);
        }
        assert!(entry.deviation.is_none());
    }
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    let (engine, employee) = engine_with_employee().await;

    let first = engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let second = engine.reconcile_employee(&employee, as_of()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn approved_time_off_lands_on_the_requested_day_only() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let before = engine.store().entries(&employee.id).await.unwrap();

    let wednesday = date(2026, 3, 4);
    let request = engine
        .submit_request(
            &employee.id,
            ChangePayload::TimeOff { date: wednesday },
            hired_at(),
        )
        .await
        .unwrap();
    engine
        .approve_request(&request.id, "admin", hired_at())
        .await
        .unwrap();
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let after = engine.store().entries(&employee.id).await.unwrap();
    for (old, new) in before.iter().zip(after.iter()) {
        if new.date == wednesday {
            assert_eq!(new.shift, "OFF");
            assert_eq!(new.hours, 0.0);
            assert_eq!(new.deviation, Some(Deviation::TimeOff));
        } else {
            assert_eq!(old, new);
        }
    }
}

#[tokio::test]
async fn time_off_survives_later_reconciliations() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let wednesday = date(2026, 3, 4);
    engine
        .direct_change(
            &employee.id,
            ChangePayload::TimeOff { date: wednesday },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    for _ in 0..3 {
        engine.reconcile_employee(&employee, as_of()).await.unwrap();
    }

    let entry = entry_for(&engine, &employee.id, wednesday).await;
    assert_eq!(entry.deviation, Some(Deviation::TimeOff));
    assert_eq!(entry.shift, "OFF");
}

#[tokio::test]
async fn swap_exchanges_both_sides() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let monday = date(2026, 3, 2);
    let saturday = date(2026, 3, 7);
    let monday_before = entry_for(&engine, &employee.id, monday).await;
    let saturday_before = entry_for(&engine, &employee.id, saturday).await;

    engine
        .direct_change(
            &employee.id,
            ChangePayload::Swap {
                from: monday,
                to: saturday,
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    let monday_after = entry_for(&engine, &employee.id, monday).await;
    let saturday_after = entry_for(&engine, &employee.id, saturday).await;

    assert_eq!(monday_after.shift, saturday_before.shift);
    assert_eq!(monday_after.hours, saturday_before.hours);
    assert_eq!(saturday_after.shift, monday_before.shift);
    assert_eq!(saturday_after.hours, monday_before.hours);
    assert_eq!(monday_after.deviation, Some(Deviation::Swapped));
    assert_eq!(saturday_after.deviation, Some(Deviation::Swapped));
}

#[tokio::test]
async fn reconcile_does_not_reswap_an_applied_pair() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let monday = date(2026, 3, 2);
    let saturday = date(2026, 3, 7);
    engine
        .direct_change(
            &employee.id,
            ChangePayload::Swap {
                from: monday,
                to: saturday,
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    // Monday picked up Saturday's OFF; each subsequent pass must leave the
    // pair exactly where the applier put it, whatever the pass count.
    for pass in 1..=3 {
        engine.reconcile_employee(&employee, as_of()).await.unwrap();

        let monday_entry = entry_for(&engine, &employee.id, monday).await;
        let saturday_entry = entry_for(&engine, &employee.id, saturday).await;
        assert_eq!(monday_entry.shift, "OFF", "pass {pass}");
        assert_eq!(monday_entry.hours, 0.0, "pass {pass}");
        assert_eq!(monday_entry.deviation, Some(Deviation::Swapped));
        assert_eq!(saturday_entry.shift, "8-5 CT", "pass {pass}");
        assert_eq!(saturday_entry.hours, 8.0, "pass {pass}");
        assert_eq!(saturday_entry.deviation, Some(Deviation::Swapped));
    }
}

#[tokio::test]
async fn reconciliation_is_idempotent_with_an_approved_swap() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    engine
        .direct_change(
            &employee.id,
            ChangePayload::Swap {
                from: date(2026, 3, 2),
                to: date(2026, 3, 7),
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    let first = engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let second = engine.reconcile_employee(&employee, as_of()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn swap_synthesizes_missing_entries_from_pattern() {
    init_logs();
    let store = Arc::new(MemoryStore::new());
    let engine = ScheduleEngine::new(store.clone());

    // Employee inserted directly, so no entries have been materialized yet.
    let employee = Employee {
        id: "emp-raw".to_string(),
        name: "Casey".to_string(),
        weekly_pattern: WeeklyPattern::default(),
        created_at: hired_at(),
        updated_at: None,
    };
    store.insert_employee(&employee).await.unwrap();

    let monday = date(2026, 3, 2);
    let saturday = date(2026, 3, 7);
    engine
        .direct_change(
            &employee.id,
            ChangePayload::Swap {
                from: monday,
                to: saturday,
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    let monday_entry = entry_for(&engine, &employee.id, monday).await;
    let saturday_entry = entry_for(&engine, &employee.id, saturday).await;
    assert_eq!(monday_entry.shift, "OFF");
    assert_eq!(saturday_entry.shift, "8-5 CT");
    assert_eq!(saturday_entry.hours, 8.0);
}

#[tokio::test]
async fn reverting_a_swap_restores_both_sides_and_rejects_the_request() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let monday = date(2026, 3, 2);
    let saturday = date(2026, 3, 7);
    let request = engine
        .direct_change(
            &employee.id,
            ChangePayload::Swap {
                from: monday,
                to: saturday,
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    engine.revert_change(&employee.id, monday).await.unwrap();

    let monday_entry = entry_for(&engine, &employee.id, monday).await;
    let saturday_entry = entry_for(&engine, &employee.id, saturday).await;
    assert_eq!(monday_entry.shift, "8-5 CT");
    assert_eq!(monday_entry.hours, 8.0);
    assert!(monday_entry.deviation.is_none());
    assert_eq!(saturday_entry.shift, "OFF");
    assert!(saturday_entry.deviation.is_none());

    let ledger = engine.requests_for(&employee.id).await.unwrap();
    let reverted = ledger.iter().find(|req| req.id == request.id).unwrap();
    assert_eq!(reverted.status, RequestStatus::Rejected);

    // With the request rejected, reconciliation leaves the pattern in place.
    engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let monday_entry = entry_for(&engine, &employee.id, monday).await;
    assert_eq!(monday_entry.shift, "8-5 CT");
    assert!(monday_entry.deviation.is_none());
}

#[tokio::test]
async fn reverting_time_off_is_the_inverse_of_applying_it() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let wednesday = date(2026, 3, 4);
    let before = entry_for(&engine, &employee.id, wednesday).await;

    let request = engine
        .direct_change(
            &employee.id,
            ChangePayload::TimeOff { date: wednesday },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();
    engine.revert_change(&employee.id, wednesday).await.unwrap();

    let after = entry_for(&engine, &employee.id, wednesday).await;
    assert_eq!(after, before);

    let ledger = engine.requests_for(&employee.id).await.unwrap();
    let reverted = ledger.iter().find(|req| req.id == request.id).unwrap();
    assert_eq!(reverted.status, RequestStatus::Rejected);
}

#[tokio::test]
async fn applier_keeps_one_deviation_per_entry() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let wednesday = date(2026, 3, 4);
    engine
        .direct_change(
            &employee.id,
            ChangePayload::TimeOff { date: wednesday },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();
    engine
        .direct_change(
            &employee.id,
            ChangePayload::CustomHours {
                date: wednesday,
                shift: "11-8 CT".to_string(),
                hours: 8.0,
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    let entry = entry_for(&engine, &employee.id, wednesday).await;
    assert_eq!(entry.deviation, Some(Deviation::CustomHours));
    assert_eq!(entry.shift, "11-8 CT");
    assert_eq!(entry.hours, 8.0);
}

#[tokio::test]
async fn pattern_change_leaves_earlier_dates_underivable() {
    let (engine, employee) = engine_with_employee().await;

    let mut night_pattern = WeeklyPattern::default();
    night_pattern.monday = ShiftConfig::new("11-8 CT", 8.0);
    night_pattern.tuesday = ShiftConfig::new("11-8 CT", 8.0);

    let cutoff = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    engine
        .update_pattern(&employee.id, night_pattern, cutoff)
        .await
        .unwrap();

    // Wipe persisted history so the expander has nothing to fall back on.
    engine
        .store()
        .replace_entries(&employee.id, &[])
        .await
        .unwrap();

    let employee = engine.store().employee(&employee.id).await.unwrap().unwrap();
    engine
        .reconcile_employee(&employee, date(2026, 3, 8))
        .await
        .unwrap();

    // 2026-03-09 is a Monday before the cutoff: placeholder, not "11-8 CT".
    let before_cutoff = entry_for(&engine, &employee.id, date(2026, 3, 9)).await;
    assert_eq!(before_cutoff.shift, "OFF");
    assert_eq!(before_cutoff.hours, 0.0);
    assert!(before_cutoff.deviation.is_none());

    // The first Monday on or after the cutoff follows the new pattern.
    let after_cutoff = entry_for(&engine, &employee.id, date(2026, 3, 16)).await;
    assert_eq!(after_cutoff.shift, "11-8 CT");
}

#[tokio::test]
async fn approval_workflow_only_moves_pending_requests() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let request = engine
        .submit_request(
            &employee.id,
            ChangePayload::TimeOff {
                date: date(2026, 3, 4),
            },
            hired_at(),
        )
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(engine.pending_requests().await.unwrap().len(), 1);

    engine
        .approve_request(&request.id, "admin", hired_at())
        .await
        .unwrap();

    // A second approval attempt must fail: the request left pending.
    let err = engine
        .approve_request(&request.id, "admin", hired_at())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not pending"), "{err}");
    assert!(engine.pending_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_apply_leaves_the_request_pending() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let request = engine
        .submit_request(
            &employee.id,
            ChangePayload::TimeOff {
                date: date(2026, 3, 4),
            },
            hired_at(),
        )
        .await
        .unwrap();

    // The employee leaves before the request is handled; approval must not
    // stamp the ledger when the deviation cannot be applied.
    engine
        .remove_employee(&employee.id, hired_at())
        .await
        .unwrap();

    let err = engine
        .approve_request(&request.id, "admin", hired_at())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");

    let ledger = engine.requests_for(&employee.id).await.unwrap();
    let stored = ledger.iter().find(|req| req.id == request.id).unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
    assert!(stored.approved_by.is_none());
    assert!(stored.approved_at.is_none());
}

#[tokio::test]
async fn rejection_stamps_the_ledger_without_touching_the_schedule() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let before = engine.store().entries(&employee.id).await.unwrap();

    let request = engine
        .submit_request(
            &employee.id,
            ChangePayload::TimeOff {
                date: date(2026, 3, 4),
            },
            hired_at(),
        )
        .await
        .unwrap();
    engine
        .reject_request(&request.id, "admin", hired_at())
        .await
        .unwrap();

    let ledger = engine.requests_for(&employee.id).await.unwrap();
    let rejected = ledger.iter().find(|req| req.id == request.id).unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.approved_by.as_deref(), Some("admin"));
    assert!(rejected.approved_at.is_some());

    assert_eq!(engine.store().entries(&employee.id).await.unwrap(), before);
}

#[tokio::test]
async fn direct_change_records_an_approved_audit_entry() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    let request = engine
        .direct_change(
            &employee.id,
            ChangePayload::TimeOff {
                date: date(2026, 3, 4),
            },
            "admin",
            hired_at(),
        )
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Approved);
    assert_eq!(request.approved_by.as_deref(), Some("admin"));
    assert!(engine.pending_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn revert_without_ledger_record_regenerates_the_single_date() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    // Simulate a desync: a flagged entry with no originating request.
    let monday = date(2026, 3, 2);
    let mut orphan = entry_for(&engine, &employee.id, monday).await;
    orphan.shift = "OFF".to_string();
    orphan.hours = 0.0;
    orphan.deviation = Some(Deviation::Swapped);
    engine
        .store()
        .upsert_entry(&employee.id, &orphan)
        .await
        .unwrap();

    engine.revert_change(&employee.id, monday).await.unwrap();

    let restored = entry_for(&engine, &employee.id, monday).await;
    assert_eq!(restored.shift, "8-5 CT");
    assert_eq!(restored.hours, 8.0);
    assert!(restored.deviation.is_none());
}

#[tokio::test]
async fn revert_on_pattern_derived_entry_is_a_noop() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();
    let before = engine.store().entries(&employee.id).await.unwrap();

    engine
        .revert_change(&employee.id, date(2026, 3, 2))
        .await
        .unwrap();

    assert_eq!(engine.store().entries(&employee.id).await.unwrap(), before);
}

#[tokio::test]
async fn operations_on_unknown_employee_fail_cleanly() {
    init_logs();
    let engine = ScheduleEngine::new(Arc::new(MemoryStore::new()));

    let err = engine
        .apply_change(
            "ghost",
            &ChangePayload::TimeOff {
                date: date(2026, 3, 4),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");

    let err = engine
        .revert_change("ghost", date(2026, 3, 4))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
}

#[tokio::test]
async fn removing_an_employee_drops_their_entries() {
    let (engine, employee) = engine_with_employee().await;
    engine.reconcile_employee(&employee, as_of()).await.unwrap();

    engine
        .remove_employee(&employee.id, hired_at())
        .await
        .unwrap();

    assert!(engine
        .store()
        .employee(&employee.id)
        .await
        .unwrap()
        .is_none());
    assert!(engine
        .store()
        .entries(&employee.id)
        .await
        .unwrap()
        .is_empty());
}
