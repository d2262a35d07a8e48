//! Single-blob adapter: everything lives in one `RwLock`-guarded structure,
//! optionally mirrored to a JSON file on every mutation.

use std::{collections::HashMap, fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{ChangeRequest, Employee, RequestUpdate, ScheduleEntry, TeamChange};

use super::ScheduleStore;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    employees: Vec<Employee>,
    /// employee id -> entries
    schedule_entries: HashMap<String, Vec<ScheduleEntry>>,
    change_requests: Vec<ChangeRequest>,
    team_changes: Vec<TeamChange>,
}

pub struct MemoryStore {
    path: Option<PathBuf>,
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Purely in-memory store; state is lost on drop.
    pub fn new() -> Self {
        Self {
            path: None,
            data: RwLock::new(StoreData::default()),
        }
    }

    /// Store backed by a JSON file, loaded if present and rewritten after
    /// every mutation.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read store from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            StoreData::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &StoreData) -> Result<()> {
        if let Some(path) = &self.path {
            let serialized = serde_json::to_string_pretty(data)?;
            fs::write(path, serialized)
                .with_context(|| format!("failed to write store to {}", path.display()))?;
        }
        Ok(())
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut StoreData) -> T) -> Result<T> {
        let mut guard = self.data.write().unwrap();
        let result = op(&mut guard);
        self.persist(&guard)?;
        Ok(result)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn employee(&self, id: &str) -> Result<Option<Employee>> {
        let guard = self.data.read().unwrap();
        Ok(guard.employees.iter().find(|emp| emp.id == id).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let guard = self.data.read().unwrap();
        Ok(guard.employees.clone())
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let employee = employee.clone();
        self.mutate(|data| data.employees.push(employee))
    }

    async fn update_employee(&self, employee: &Employee) -> Result<()> {
        let employee = employee.clone();
        self.mutate(|data| {
            if let Some(existing) = data.employees.iter_mut().find(|emp| emp.id == employee.id) {
                *existing = employee;
            }
        })
    }

    async fn remove_employee(&self, id: &str) -> Result<()> {
        self.mutate(|data| {
            data.employees.retain(|emp| emp.id != id);
            data.schedule_entries.remove(id);
        })
    }

    async fn entries(&self, employee_id: &str) -> Result<Vec<ScheduleEntry>> {
        let guard = self.data.read().unwrap();
        Ok(guard
            .schedule_entries
            .get(employee_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_entries(&self, employee_id: &str, entries: &[ScheduleEntry]) -> Result<()> {
        let entries = entries.to_vec();
        self.mutate(|data| {
            data.schedule_entries.insert(employee_id.to_string(), entries);
        })
    }

    async fn upsert_entry(&self, employee_id: &str, entry: &ScheduleEntry) -> Result<()> {
        let entry = entry.clone();
        self.mutate(|data| {
            let entries = data
                .schedule_entries
                .entry(employee_id.to_string())
                .or_default();
            match entries.iter_mut().find(|e| e.date == entry.date) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        })
    }

    async fn requests(&self) -> Result<Vec<ChangeRequest>> {
        let guard = self.data.read().unwrap();
        Ok(guard.change_requests.clone())
    }

    async fn append_request(&self, request: &ChangeRequest) -> Result<()> {
        let request = request.clone();
        self.mutate(|data| data.change_requests.push(request))
    }

    async fn update_request(&self, id: &str, update: &RequestUpdate) -> Result<()> {
        let update = update.clone();
        self.mutate(|data| {
            if let Some(request) = data.change_requests.iter_mut().find(|req| req.id == id) {
                if let Some(status) = update.status {
                    request.status = status;
                }
                if let Some(approved_by) = update.approved_by {
                    request.approved_by = Some(approved_by);
                }
                if let Some(approved_at) = update.approved_at {
                    request.approved_at = Some(approved_at);
                }
            }
        })
    }

    async fn append_team_change(&self, change: &TeamChange) -> Result<()> {
        let change = change.clone();
        self.mutate(|data| data.team_changes.push(change))
    }

    async fn latest_pattern_change(&self, employee_id: &str) -> Result<Option<TeamChange>> {
        let guard = self.data.read().unwrap();
        Ok(guard
            .team_changes
            .iter()
            .filter(|change| {
                change.employee_id.as_deref() == Some(employee_id)
                    && change.kind.affects_pattern()
            })
            .max_by_key(|change| change.timestamp)
            .cloned())
    }
}
