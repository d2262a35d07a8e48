//! Recurring work schedules for a small team.
//!
//! Each employee carries a fixed weekly shift pattern; a rolling six-month
//! horizon of concrete daily entries is derived from it. Workers and
//! administrators deviate from the pattern (time off, custom hours, day
//! swaps) through a request/approval ledger, and deviations can later be
//! reverted to the pattern. The [`engine::ScheduleEngine`] reconciles the
//! pattern, persisted history, and approved deviations into the
//! authoritative entry set through the [`store::ScheduleStore`] contract.

pub mod engine;
pub mod models;
pub mod store;

pub use engine::ScheduleEngine;
pub use store::{MemoryStore, ScheduleStore, SqliteStore};
