//! Persistence contract and its two interchangeable adapters.
//!
//! The engine only ever talks to [`ScheduleStore`]; whether the data lives in
//! a single in-memory/JSON blob or in SQLite tables is an adapter concern.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChangeRequest, Employee, RequestUpdate, ScheduleEntry, TeamChange};

mod helpers;
mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn employee(&self, id: &str) -> Result<Option<Employee>>;

    async fn list_employees(&self) -> Result<Vec<Employee>>;

    async fn insert_employee(&self, employee: &Employee) -> Result<()>;

    async fn update_employee(&self, employee: &Employee) -> Result<()>;

    /// Removes the employee and all of their schedule entries.
    async fn remove_employee(&self, id: &str) -> Result<()>;

    async fn entries(&self, employee_id: &str) -> Result<Vec<ScheduleEntry>>;

    /// Full-replace semantics: the previous entry set for the employee is
    /// discarded wholesale.
    async fn replace_entries(&self, employee_id: &str, entries: &[ScheduleEntry]) -> Result<()>;

    /// Single-entry upsert keyed on (employee_id, date).
    async fn upsert_entry(&self, employee_id: &str, entry: &ScheduleEntry) -> Result<()>;

    async fn requests(&self) -> Result<Vec<ChangeRequest>>;

    async fn append_request(&self, request: &ChangeRequest) -> Result<()>;

    /// Applies a partial update to a ledger record. Updating an unknown id
    /// is a no-op.
    async fn update_request(&self, id: &str, update: &RequestUpdate) -> Result<()>;

    async fn append_team_change(&self, change: &TeamChange) -> Result<()>;

    /// Newest `employee_added` or `schedule_pattern_changed` record for the
    /// employee; its timestamp is the pattern cutoff.
    async fn latest_pattern_change(&self, employee_id: &str) -> Result<Option<TeamChange>>;
}
