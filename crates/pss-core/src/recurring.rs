//! Recurring tasks -- a task repeated every `frequency` days until an end date.
//!
//! Occurrences are materialized on demand from the task's own fields; nothing is
//! cached, so expansion is restartable and always reflects the current definition.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::{self, add_days, date_to_int, int_to_date};
use crate::error::{Result, ScheduleError};
use crate::task::{Overlappable, Recurring, Task, SEPARATOR};

/// Largest accepted gap between occurrences, in days.
pub const MAX_FREQUENCY: u32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTask {
    task: Task,
    end_date: NaiveDate,
    frequency: u32,
}

impl RecurringTask {
    /// Build a validated recurring task.
    ///
    /// # Errors
    /// Everything [`Task::new`] rejects, plus an invalid end date, an end date
    /// before the start date, or a frequency outside `1..=7`.
    pub fn new(
        name: impl Into<String>,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
        end_date: u32,
        frequency: u32,
    ) -> Result<Self> {
        let task = Task::new(name, task_type, date, start_time, duration)?;
        let end_date = int_to_date(end_date)
            .map_err(|_| ScheduleError::Validation(format!("bad end date {}", end_date)))?;
        if end_date < task.date() {
            return Err(ScheduleError::Validation(
                "end date before start date".to_string(),
            ));
        }
        if !(1..=MAX_FREQUENCY).contains(&frequency) {
            return Err(ScheduleError::Validation(format!(
                "bad frequency {} (must be between 1 and {})",
                frequency, MAX_FREQUENCY
            )));
        }
        Ok(Self {
            task,
            end_date,
            frequency,
        })
    }

    /// The per-occurrence definition, dated on the first occurrence.
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn date(&self) -> NaiveDate {
        self.task.date()
    }

    pub fn start_time(&self) -> f64 {
        self.task.start_time()
    }

    pub fn duration(&self) -> f64 {
        self.task.duration()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn end_date_int(&self) -> u32 {
        date_to_int(self.end_date)
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Exclusive boundary of the series: end date plus start time plus duration.
    pub fn end(&self) -> Result<NaiveDateTime> {
        calendar::instant(self.end_date, self.start_time() + self.duration())
    }

    /// Whether two definitions describe the same series of intervals.
    pub fn same_series(&self, other: &RecurringTask) -> bool {
        self.task.same_slot(&other.task)
            && self.end_date == other.end_date
            && self.frequency == other.frequency
    }

    /// Whether the series produces an occurrence on `date`.
    ///
    /// An occurrence exists on every whole multiple of `frequency` days from the
    /// start date whose end instant falls strictly before [`RecurringTask::end`],
    /// which for a shared start time and duration means strictly before the end date.
    pub fn is_occurrence_date(&self, date: NaiveDate) -> bool {
        let offset = (date - self.task.date()).num_days();
        offset >= 0 && date < self.end_date && offset % self.frequency as i64 == 0
    }

    /// Whether any occurrence overlaps `task`.
    pub fn overlaps(&self, task: &Task) -> Result<bool> {
        Ok(!self.overlapping_occurrences(task)?.is_empty())
    }

    /// Occurrences of `self` that overlap some occurrence of `other`.
    ///
    /// Expands `self` in full and asks `other` about each occurrence. This costs a
    /// pass over the whole series, which is acceptable for the rare
    /// recurring-against-recurring check.
    pub fn overlapping_occurrences_recurring(&self, other: &RecurringTask) -> Result<Vec<Task>> {
        let mut overlapping = Vec::new();
        for occurrence in self.occurrences()? {
            if other.overlaps(&occurrence)? {
                overlapping.push(occurrence);
            }
        }
        Ok(overlapping)
    }

    pub fn overlaps_recurring(&self, other: &RecurringTask) -> Result<bool> {
        Ok(!self.overlapping_occurrences_recurring(other)?.is_empty())
    }
}

impl Recurring for RecurringTask {
    /// Every occurrence from the start date up to the exclusive end boundary.
    fn occurrences(&self) -> Result<Vec<Task>> {
        let end = self.end()?;
        let step = self.frequency as i64;
        let mut date = self.task.date();
        let mut occurrences = Vec::new();

        loop {
            let occurrence = self.task.with_date(date);
            if occurrence.end()? >= end {
                break;
            }
            occurrences.push(occurrence);
            date = add_days(date, step)?;
        }

        Ok(occurrences)
    }
}

impl Overlappable for RecurringTask {
    /// Only three cycles can touch a task dated `T`: the cycle on `T` itself when
    /// `T` is aligned, and the nearest cycles before and after it. Every
    /// occurrence ends less than two days after its own date, so nothing further
    /// away can reach the task.
    fn overlapping_occurrences(&self, task: &Task) -> Result<Vec<Task>> {
        let step = self.frequency as i64;
        let offset = (task.date() - self.task.date()).num_days();
        let floor = offset.div_euclid(step) * step;

        let mut candidates = Vec::with_capacity(3);
        if floor == offset {
            candidates.push(floor - step);
        }
        candidates.push(floor);
        candidates.push(floor + step);

        let mut overlapping = Vec::new();
        for days in candidates {
            if days < 0 {
                continue;
            }
            let date = add_days(self.task.date(), days)?;
            if !self.is_occurrence_date(date) {
                continue;
            }
            let occurrence = self.task.with_date(date);
            if occurrence.overlaps(task)? {
                overlapping.push(occurrence);
            }
        }
        Ok(overlapping)
    }
}

impl fmt::Display for RecurringTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;
        self.task.write_fields(f)?;
        writeln!(f)?;
        writeln!(f, "End Date: {}", self.end_date.format("%Y-%m-%d"))?;
        writeln!(f, "Frequency: {}", self.frequency)?;
        write!(f, "{}", SEPARATOR)
    }
}
