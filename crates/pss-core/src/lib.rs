//! # pss-core
//!
//! Scheduling engine for a personal schedule: one-off tasks, recurring tasks that
//! repeat every N days, and anti-tasks that cancel a single recurring occurrence.
//!
//! The engine keeps the schedule free of overlaps. Recurring tasks are expanded
//! into concrete occurrences only as far as a check needs, and an occurrence
//! covered by an anti-task frees its slot for other commitments.
//!
//! ## Modules
//!
//! - [`calendar`]: `YYYYMMDD` date encoding and absolute-instant arithmetic
//! - [`task`]: the base [`Task`], the type taxonomy and the capability traits
//!   ([`Overlappable`], [`Cancellable`], [`Recurring`])
//! - [`anti_task`]: [`AntiTask`] and its cancellation rules
//! - [`recurring`]: [`RecurringTask`] occurrence expansion and overlap search
//! - [`schedule`]: the [`Schedule`] aggregate enforcing name and overlap invariants
//! - [`storage`]: JSON schedule files
//! - [`error`]: Error types

pub mod anti_task;
pub mod calendar;
pub mod error;
pub mod recurring;
pub mod schedule;
pub mod storage;
pub mod task;

pub use anti_task::AntiTask;
pub use error::{ErrorKind, ScheduleError};
pub use recurring::RecurringTask;
pub use schedule::{Schedule, ScheduledTask};
pub use storage::{tasks_to_json, write_task_list};
pub use task::{
    label_occurrences, Cancellable, Overlappable, Recurring, Task, TaskFamily, TaskType,
};
