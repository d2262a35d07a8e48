//! Team management: employees, their patterns, and the audit log whose
//! timestamps double as pattern cutoffs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::models::{Employee, TeamChange, TeamChangeKind, WeeklyPattern};

use super::ScheduleEngine;

impl ScheduleEngine {
    /// Adds an employee (default pattern unless one is given), records the
    /// `employee_added` audit entry, and materializes their schedule.
    pub async fn add_employee(
        &self,
        name: &str,
        pattern: Option<WeeklyPattern>,
        now: DateTime<Utc>,
    ) -> Result<Employee> {
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            weekly_pattern: pattern.unwrap_or_default(),
            created_at: now,
            updated_at: None,
        };

        self.store.insert_employee(&employee).await?;
        self.record_team_change(
            TeamChangeKind::EmployeeAdded,
            Some(&employee.id),
            json!({ "name": employee.name }),
            now,
        )
        .await?;

        self.reconcile_employee(&employee, now.date_naive()).await?;
        info!("Added employee {} ({})", employee.name, employee.id);
        Ok(employee)
    }

    /// Renames an employee. Does not move the pattern cutoff.
    pub async fn rename_employee(
        &self,
        employee_id: &str,
        new_name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut employee = self.require_employee(employee_id).await?;
        let old_name = std::mem::replace(&mut employee.name, new_name.to_string());
        employee.updated_at = Some(now);
        self.store.update_employee(&employee).await?;

        self.record_team_change(
            TeamChangeKind::EmployeeUpdated,
            Some(employee_id),
            json!({ "oldName": old_name, "newName": new_name }),
            now,
        )
        .await
    }

    /// Replaces the weekly pattern wholesale, records the cutoff-bearing
    /// `schedule_pattern_changed` entry, and re-derives the horizon. Entries
    /// from before the change stay as persisted history.
    pub async fn update_pattern(
        &self,
        employee_id: &str,
        pattern: WeeklyPattern,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut employee = self.require_employee(employee_id).await?;
        employee.weekly_pattern = pattern;
        employee.updated_at = Some(now);
        self.store.update_employee(&employee).await?;

        self.record_team_change(
            TeamChangeKind::SchedulePatternChanged,
            Some(employee_id),
            json!({ "pattern": employee.weekly_pattern }),
            now,
        )
        .await?;

        self.reconcile_employee(&employee, now.date_naive()).await?;
        Ok(())
    }

    /// Removes the employee along with their schedule entries.
    pub async fn remove_employee(&self, employee_id: &str, now: DateTime<Utc>) -> Result<()> {
        let employee = self.require_employee(employee_id).await?;
        self.store.remove_employee(employee_id).await?;

        self.record_team_change(
            TeamChangeKind::EmployeeRemoved,
            Some(employee_id),
            json!({ "name": employee.name }),
            now,
        )
        .await
    }

    async fn record_team_change(
        &self,
        kind: TeamChangeKind,
        employee_id: Option<&str>,
        details: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let change = TeamChange {
            id: Uuid::new_v4().to_string(),
            kind,
            employee_id: employee_id.map(|id| id.to_string()),
            timestamp: now,
            details,
        };
        self.store.append_team_change(&change).await
    }
}
