//! The schedule reconciliation engine.
//!
//! One [`ScheduleEngine`] owns a handle to the persistence contract; its
//! operations are split per concern across this module's files.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::{models::Employee, store::ScheduleStore};

mod apply;
mod approvals;
mod pattern;
mod reconcile;
mod revert;
mod team;

pub use pattern::{horizon_dates, pattern_entry};

#[derive(Clone)]
pub struct ScheduleEngine {
    store: Arc<dyn ScheduleStore>,
}

impl ScheduleEngine {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn ScheduleStore> {
        self.store.clone()
    }

    pub(crate) async fn require_employee(&self, id: &str) -> Result<Employee> {
        self.store
            .employee(id)
            .await?
            .ok_or_else(|| anyhow!("employee {id} not found"))
    }

    /// Timestamp after which the employee's current pattern is effective.
    pub(crate) async fn pattern_cutoff(&self, employee_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .store
            .latest_pattern_change(employee_id)
            .await?
            .map(|change| change.timestamp))
    }
}
