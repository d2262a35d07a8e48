mod employee;
mod entry;
mod request;
mod team_change;

pub use employee::{Employee, ShiftConfig, WeeklyPattern};
pub use entry::{Deviation, ScheduleEntry};
pub use request::{ChangePayload, ChangeRequest, RequestStatus, RequestUpdate};
pub use team_change::{TeamChange, TeamChangeKind};
