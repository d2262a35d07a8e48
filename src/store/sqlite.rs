//! Per-table adapter over rusqlite.
//!
//! The connection lives on a dedicated worker thread; callers submit
//! closures over an mpsc channel and await the reply on a oneshot.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::oneshot;

use crate::models::{
    ChangePayload, ChangeRequest, Employee, RequestUpdate, ScheduleEntry, TeamChange,
    WeeklyPattern,
};

use super::{
    helpers::{
        parse_date, parse_datetime, parse_deviation, parse_optional_datetime, parse_status,
        parse_team_change_kind,
    },
    migrations::run_migrations,
    ScheduleStore,
};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<StoreInner>,
    db_path: Arc<PathBuf>,
}

impl SqliteStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("shiftboard-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Schedule database initialized at {}", db_path.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}

fn row_to_employee(row: &Row) -> Result<Employee> {
    let pattern_json: String = row.get("weekly_pattern")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: Option<String> = row.get("updated_at")?;
    let weekly_pattern: WeeklyPattern = serde_json::from_str(&pattern_json)
        .context("failed to decode weekly_pattern")?;

    Ok(Employee {
        id: row.get("id")?,
        name: row.get("name")?,
        weekly_pattern,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_optional_datetime(updated_at, "updated_at")?,
    })
}

fn row_to_entry(row: &Row) -> Result<ScheduleEntry> {
    let date: String = row.get("date")?;
    let deviation: Option<String> = row.get("deviation")?;

    Ok(ScheduleEntry {
        date: parse_date(&date, "date")?,
        shift: row.get("shift")?,
        hours: row.get("hours")?,
        deviation: parse_deviation(deviation)?,
    })
}

fn row_to_request(row: &Row) -> Result<ChangeRequest> {
    let kind: String = row.get("kind")?;
    let requested_at: String = row.get("requested_at")?;
    let status: String = row.get("status")?;
    let approved_at: Option<String> = row.get("approved_at")?;

    let payload = match kind.as_str() {
        "time_off" => {
            let date: String = row
                .get::<_, Option<String>>("date")?
                .ok_or_else(|| anyhow!("time_off request without a date"))?;
            ChangePayload::TimeOff {
                date: parse_date(&date, "date")?,
            }
        }
        "custom_hours" => {
            let date: String = row
                .get::<_, Option<String>>("date")?
                .ok_or_else(|| anyhow!("custom_hours request without a date"))?;
            let shift: String = row
                .get::<_, Option<String>>("custom_shift")?
                .ok_or_else(|| anyhow!("custom_hours request without a shift"))?;
            let hours: f64 = row
                .get::<_, Option<f64>>("custom_hours")?
                .ok_or_else(|| anyhow!("custom_hours request without hours"))?;
            ChangePayload::CustomHours {
                date: parse_date(&date, "date")?,
                shift,
                hours,
            }
        }
        "swap" => {
            let from: String = row
                .get::<_, Option<String>>("swap_from")?
                .ok_or_else(|| anyhow!("swap request without swap_from"))?;
            let to: String = row
                .get::<_, Option<String>>("swap_to")?
                .ok_or_else(|| anyhow!("swap request without swap_to"))?;
            ChangePayload::Swap {
                from: parse_date(&from, "swap_from")?,
                to: parse_date(&to, "swap_to")?,
            }
        }
        other => return Err(anyhow!("unknown request kind {other}")),
    };

    Ok(ChangeRequest {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        payload,
        status: parse_status(&status)?,
        requested_at: parse_datetime(&requested_at, "requested_at")?,
        approved_by: row.get("approved_by")?,
        approved_at: parse_optional_datetime(approved_at, "approved_at")?,
    })
}

fn row_to_team_change(row: &Row) -> Result<TeamChange> {
    let kind: String = row.get("kind")?;
    let timestamp: String = row.get("timestamp")?;
    let details: String = row.get("details")?;

    Ok(TeamChange {
        id: row.get("id")?,
        kind: parse_team_change_kind(&kind)?,
        employee_id: row.get("employee_id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        details: serde_json::from_str(&details).context("failed to decode details")?,
    })
}

const EMPLOYEE_COLUMNS: &str = "id, name, weekly_pattern, created_at, updated_at";
const REQUEST_COLUMNS: &str = "id, employee_id, kind, date, swap_from, swap_to, custom_shift, \
     custom_hours, status, requested_at, approved_by, approved_at";

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn employee(&self, id: &str) -> Result<Option<Employee>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"
            ))?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_employee(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY created_at ASC"
            ))?;
            let mut rows = stmt.query([])?;
            let mut employees = Vec::new();
            while let Some(row) = rows.next()? {
                employees.push(row_to_employee(row)?);
            }
            Ok(employees)
        })
        .await
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let record = employee.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO employees (id, name, weekly_pattern, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.name,
                    serde_json::to_string(&record.weekly_pattern)?,
                    record.created_at.to_rfc3339(),
                    record.updated_at.map(|dt| dt.to_rfc3339()),
                ],
            )
            .with_context(|| "failed to insert employee")?;
            Ok(())
        })
        .await
    }

    async fn update_employee(&self, employee: &Employee) -> Result<()> {
        let record = employee.clone();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE employees
                 SET name = ?1,
                     weekly_pattern = ?2,
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    record.name,
                    serde_json::to_string(&record.weekly_pattern)?,
                    record.updated_at.map(|dt| dt.to_rfc3339()),
                    record.id,
                ],
            )
            .with_context(|| "failed to update employee")?;
            Ok(())
        })
        .await
    }

    async fn remove_employee(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM schedule_entries WHERE employee_id = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM employees WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn entries(&self, employee_id: &str) -> Result<Vec<ScheduleEntry>> {
        let employee_id = employee_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date, shift, hours, deviation
                 FROM schedule_entries
                 WHERE employee_id = ?1
                 ORDER BY date ASC",
            )?;
            let mut rows = stmt.query(params![employee_id])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    async fn replace_entries(&self, employee_id: &str, entries: &[ScheduleEntry]) -> Result<()> {
        let employee_id = employee_id.to_string();
        let entries = entries.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM schedule_entries WHERE employee_id = ?1",
                params![employee_id],
            )?;
            for entry in &entries {
                tx.execute(
                    "INSERT INTO schedule_entries (employee_id, date, shift, hours, deviation)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        employee_id,
                        entry.date.to_string(),
                        entry.shift,
                        entry.hours,
                        entry.deviation.map(|d| d.as_str()),
                    ],
                )?;
            }
            tx.commit().with_context(|| "failed to replace entries")?;
            Ok(())
        })
        .await
    }

    async fn upsert_entry(&self, employee_id: &str, entry: &ScheduleEntry) -> Result<()> {
        let employee_id = employee_id.to_string();
        let entry = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO schedule_entries (employee_id, date, shift, hours, deviation)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (employee_id, date) DO UPDATE SET
                     shift = excluded.shift,
                     hours = excluded.hours,
                     deviation = excluded.deviation",
                params![
                    employee_id,
                    entry.date.to_string(),
                    entry.shift,
                    entry.hours,
                    entry.deviation.map(|d| d.as_str()),
                ],
            )
            .with_context(|| "failed to upsert entry")?;
            Ok(())
        })
        .await
    }

    async fn requests(&self) -> Result<Vec<ChangeRequest>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REQUEST_COLUMNS} FROM change_requests ORDER BY requested_at ASC, rowid ASC"
            ))?;
            let mut rows = stmt.query([])?;
            let mut requests = Vec::new();
            while let Some(row) = rows.next()? {
                requests.push(row_to_request(row)?);
            }
            Ok(requests)
        })
        .await
    }

    async fn append_request(&self, request: &ChangeRequest) -> Result<()> {
        let record = request.clone();
        self.execute(move |conn| {
            let (date, swap_from, swap_to, custom_shift, custom_hours) = match &record.payload {
                ChangePayload::TimeOff { date } => {
                    (Some(date.to_string()), None, None, None, None)
                }
                ChangePayload::CustomHours { date, shift, hours } => (
                    Some(date.to_string()),
                    None,
                    None,
                    Some(shift.clone()),
                    Some(*hours),
                ),
                ChangePayload::Swap { from, to } => (
                    Some(from.to_string()),
                    Some(from.to_string()),
                    Some(to.to_string()),
                    None,
                    None,
                ),
            };

            conn.execute(
                "INSERT INTO change_requests
                     (id, employee_id, kind, date, swap_from, swap_to, custom_shift,
                      custom_hours, status, requested_at, approved_by, approved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    record.employee_id,
                    record.payload.kind_str(),
                    date,
                    swap_from,
                    swap_to,
                    custom_shift,
                    custom_hours,
                    record.status.as_str(),
                    record.requested_at.to_rfc3339(),
                    record.approved_by,
                    record.approved_at.map(|dt| dt.to_rfc3339()),
                ],
            )
            .with_context(|| "failed to append change request")?;
            Ok(())
        })
        .await
    }

    async fn update_request(&self, id: &str, update: &RequestUpdate) -> Result<()> {
        let id = id.to_string();
        let update = update.clone();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE change_requests
                 SET status = COALESCE(?1, status),
                     approved_by = COALESCE(?2, approved_by),
                     approved_at = COALESCE(?3, approved_at)
                 WHERE id = ?4",
                params![
                    update.status.map(|s| s.as_str()),
                    update.approved_by,
                    update.approved_at.map(|dt| dt.to_rfc3339()),
                    id,
                ],
            )
            .with_context(|| "failed to update change request")?;
            Ok(())
        })
        .await
    }

    async fn append_team_change(&self, change: &TeamChange) -> Result<()> {
        let record = change.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO team_changes (id, kind, employee_id, timestamp, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.kind.as_str(),
                    record.employee_id,
                    record.timestamp.to_rfc3339(),
                    serde_json::to_string(&record.details)?,
                ],
            )
            .with_context(|| "failed to append team change")?;
            Ok(())
        })
        .await
    }

    async fn latest_pattern_change(&self, employee_id: &str) -> Result<Option<TeamChange>> {
        let employee_id = employee_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, employee_id, timestamp, details
                 FROM team_changes
                 WHERE employee_id = ?1
                   AND kind IN ('employee_added', 'schedule_pattern_changed')
                 ORDER BY timestamp DESC
                 LIMIT 1",
            )?;
            let row = stmt
                .query_row(params![employee_id], |row| Ok(row_to_team_change(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }
}
