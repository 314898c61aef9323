//! Anti-tasks -- records that cancel one occurrence of a recurring task.

use std::fmt;

use crate::calendar::hours_between;
use crate::error::{Result, ScheduleError};
use crate::recurring::RecurringTask;
use crate::task::{Cancellable, Task, TaskType};

/// A [`Task`] of type `Cancellation` that frees the slot of a recurring occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct AntiTask {
    task: Task,
}

impl AntiTask {
    /// Build a validated anti-task.
    ///
    /// # Errors
    /// Everything [`Task::new`] rejects, plus any type other than `Cancellation`.
    pub fn new(
        name: impl Into<String>,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<Self> {
        let task = Task::new(name, task_type, date, start_time, duration)?;
        if task.task_type() != TaskType::Cancellation {
            return Err(ScheduleError::Validation(format!(
                "{:?} is not an anti type",
                task_type
            )));
        }
        Ok(Self { task })
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// The occurrence of `recurring` that this anti-task nullifies, if any.
    ///
    /// Start time and duration must equal the recurring task's, the date must fall
    /// on a whole multiple of the frequency from the recurring start date, and the
    /// occurrence must be one the series actually produces. The returned task
    /// carries the recurring task's name and type on the anti-task's date.
    pub fn cancelled_occurrence(&self, recurring: &RecurringTask) -> Option<Task> {
        if self.task.start_time() != recurring.start_time()
            || self.task.duration() != recurring.duration()
        {
            return None;
        }
        if !recurring.is_occurrence_date(self.task.date()) {
            return None;
        }
        Some(recurring.task().with_date(self.task.date()))
    }
}

impl Cancellable for AntiTask {
    /// Whether this anti-task's interval contains the remainder of `task`.
    ///
    /// The anti-task must start no later than `task`, and its duration must cover
    /// the gap between the two starts plus the whole of `task`'s duration.
    fn cancels(&self, task: &Task) -> Result<bool> {
        let ours = self.task.start()?;
        let theirs = task.start()?;
        if theirs < ours {
            return Ok(false);
        }
        let gap = hours_between(ours, theirs);
        Ok(self.task.duration() >= gap + task.duration())
    }
}

impl fmt::Display for AntiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.task, f)
    }
}
