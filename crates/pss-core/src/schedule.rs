//! The schedule aggregate -- three name-keyed collections and the conflict engine.
//!
//! Every mutation goes through [`Schedule`] so that two invariants hold after
//! each successful call:
//!
//! - a name appears in at most one of the transient, anti and recurring collections;
//! - no transient task or recurring occurrence overlaps another commitment unless
//!   the occurrence is covered by an anti-task.
//!
//! A call that would break either invariant fails and leaves the schedule exactly
//! as it was.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::anti_task::AntiTask;
use crate::calendar::{date_to_string, iso_week};
use crate::error::{Result, ScheduleError};
use crate::recurring::RecurringTask;
use crate::task::{
    label_occurrences, Cancellable, Overlappable, Recurring, Task, TaskFamily, TaskType,
};

/// A stored entity of any family.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    Transient(Task),
    Anti(AntiTask),
    Recurring(RecurringTask),
}

impl ScheduledTask {
    /// The common task fields (for a recurring task, its first occurrence).
    pub fn task(&self) -> &Task {
        match self {
            ScheduledTask::Transient(task) => task,
            ScheduledTask::Anti(anti) => anti.task(),
            ScheduledTask::Recurring(recurring) => recurring.task(),
        }
    }

    pub fn name(&self) -> &str {
        self.task().name()
    }

    /// The collection the entity is stored in.
    pub fn family(&self) -> TaskFamily {
        match self {
            ScheduledTask::Transient(_) => TaskFamily::Transient,
            ScheduledTask::Anti(_) => TaskFamily::Anti,
            ScheduledTask::Recurring(_) => TaskFamily::Recurring,
        }
    }
}

impl fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduledTask::Transient(task) => fmt::Display::fmt(task, f),
            ScheduledTask::Anti(anti) => fmt::Display::fmt(anti, f),
            ScheduledTask::Recurring(recurring) => fmt::Display::fmt(recurring, f),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    transient: BTreeMap<String, Task>,
    anti: BTreeMap<String, AntiTask>,
    recurring: BTreeMap<String, RecurringTask>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transient.len() + self.anti.len() + self.recurring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn transient_tasks(&self) -> impl Iterator<Item = &Task> {
        self.transient.values()
    }

    pub fn anti_tasks(&self) -> impl Iterator<Item = &AntiTask> {
        self.anti.values()
    }

    pub fn recurring_tasks(&self) -> impl Iterator<Item = &RecurringTask> {
        self.recurring.values()
    }

    /// Look a stored entity up by name in any collection.
    pub fn get(&self, name: &str) -> Option<ScheduledTask> {
        if let Some(task) = self.transient.get(name) {
            return Some(ScheduledTask::Transient(task.clone()));
        }
        if let Some(anti) = self.anti.get(name) {
            return Some(ScheduledTask::Anti(anti.clone()));
        }
        self.recurring
            .get(name)
            .map(|recurring| ScheduledTask::Recurring(recurring.clone()))
    }

    /// Every stored entity: transient, then anti, then recurring, each by name.
    pub fn tasks(&self) -> Vec<ScheduledTask> {
        let transient = self.transient.values().cloned().map(ScheduledTask::Transient);
        let anti = self.anti.values().cloned().map(ScheduledTask::Anti);
        let recurring = self.recurring.values().cloned().map(ScheduledTask::Recurring);
        transient.chain(anti).chain(recurring).collect()
    }

    // ---------------------------------------------------------------------
    // Add
    // ---------------------------------------------------------------------

    /// Add a one-off task.
    ///
    /// # Errors
    /// `Validation` for an empty name, a non-transient type or bad fields;
    /// `NameConflict` if the name is taken; `SchedulingConflict` if the task
    /// overlaps a transient task or an uncancelled recurring occurrence.
    pub fn add_transient(
        &mut self,
        name: &str,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<()> {
        self.ensure_name_free(name)?;
        ensure_family(task_type, TaskFamily::Transient)?;
        let task = Task::new(name, task_type, date, start_time, duration)?;
        self.ensure_no_add_conflict(&task, name)?;

        debug!(task = name, family = "transient", "task added");
        self.transient.insert(name.to_string(), task);
        Ok(())
    }

    /// Add a single dated occurrence of a recurring type as a standalone task.
    ///
    /// The occurrence date is appended to the name (`"Name (YYYY-MM-DD)"`) unless
    /// it is already there; otherwise the checks match [`Schedule::add_transient`]
    /// with a recurring type required instead of a transient one.
    pub fn add_subtask(
        &mut self,
        name: &str,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(ScheduleError::Validation("name cannot be empty".to_string()));
        }
        let name = subtask_name(name, date);

        self.ensure_name_free(&name)?;
        ensure_family(task_type, TaskFamily::Recurring)?;
        let task = Task::new(name.as_str(), task_type, date, start_time, duration)?;
        self.ensure_no_add_conflict(&task, &name)?;

        debug!(task = %name, family = "subtask", "task added");
        self.transient.insert(name, task);
        Ok(())
    }

    /// Add an anti-task.
    ///
    /// # Errors
    /// `Validation` for an empty name, a type other than `Cancellation` or bad
    /// fields; `NameConflict` if the name is taken; `SchedulingConflict` if it
    /// overlaps another anti-task; `CancellationMismatch` if no recurring task
    /// has an occurrence exactly matching it.
    pub fn add_anti(
        &mut self,
        name: &str,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<()> {
        self.ensure_name_free(name)?;
        ensure_family(task_type, TaskFamily::Anti)?;
        let anti = AntiTask::new(name, task_type, date, start_time, duration)?;
        self.ensure_anti_fits(&anti)?;

        debug!(task = name, family = "anti", "task added");
        self.anti.insert(name.to_string(), anti);
        Ok(())
    }

    /// Add a recurring task.
    ///
    /// # Errors
    /// `Validation` for an empty name, a non-recurring type or bad fields;
    /// `NameConflict` if the name is taken; `SchedulingConflict` if an
    /// uncancelled occurrence overlaps a transient task, or any occurrence
    /// overlaps another recurring task.
    #[allow(clippy::too_many_arguments)]
    pub fn add_recurring(
        &mut self,
        name: &str,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
        end_date: u32,
        frequency: u32,
    ) -> Result<()> {
        self.ensure_name_free(name)?;
        ensure_family(task_type, TaskFamily::Recurring)?;
        let recurring = RecurringTask::new(
            name, task_type, date, start_time, duration, end_date, frequency,
        )?;
        if let Some(conflict) = self.find_recurring_conflict(&recurring)? {
            return Err(ScheduleError::SchedulingConflict(format!(
                "{} overlaps {}",
                name, conflict
            )));
        }

        debug!(task = name, family = "recurring", "task added");
        self.recurring.insert(name.to_string(), recurring);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    /// Delete a task by name.
    ///
    /// Transient tasks go unconditionally. A recurring task takes every anti-task
    /// cancelling one of its occurrences with it. An anti-task is only removed if
    /// the occurrence it frees does not then overlap anything.
    ///
    /// # Errors
    /// `NotFound` for an unknown name; `CancellationMismatch` when removing an
    /// anti-task would reopen a conflict.
    pub fn delete_task(&mut self, name: &str) -> Result<()> {
        if self.transient.remove(name).is_some() {
            debug!(task = name, family = "transient", "task deleted");
            return Ok(());
        }

        if let Some(recurring) = self.recurring.remove(name) {
            let orphaned = self.anti_tasks_cancelling(&recurring);
            for anti in &orphaned {
                self.anti.remove(anti);
            }
            debug!(
                task = name,
                family = "recurring",
                cascaded = orphaned.len(),
                "task deleted"
            );
            return Ok(());
        }

        if let Some(anti) = self.anti.get(name).cloned() {
            return self.transaction(|schedule| {
                schedule.anti.remove(name);
                if let Some(conflict) = schedule.find_delete_conflict(&anti)? {
                    return Err(ScheduleError::CancellationMismatch(format!(
                        "deleting {} would reopen a conflict with {}",
                        name, conflict
                    )));
                }
                debug!(task = name, family = "anti", "task deleted");
                Ok(())
            });
        }

        Err(ScheduleError::NotFound(name.to_string()))
    }

    // ---------------------------------------------------------------------
    // Edit
    // ---------------------------------------------------------------------

    /// Replace a transient task (or stored subtask) with new fields.
    ///
    /// A change of name or type only is a plain rename. Anything else is checked
    /// exactly like an add, with the old task out of the way; on failure the old
    /// task is left in place under its old name. A subtask keeps its
    /// `" (YYYY-MM-DD)"` suffix, rewritten for the new date.
    pub fn edit_transient(
        &mut self,
        name: &str,
        new_name: &str,
        new_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<()> {
        let old = self
            .transient
            .get(name)
            .cloned()
            .ok_or_else(|| ScheduleError::NotFound(name.to_string()))?;
        let resolved = if old.family() == TaskFamily::Recurring {
            let old_suffix = format!(" ({})", date_to_string(old.date_int()));
            subtask_name(new_name.strip_suffix(&old_suffix).unwrap_or(new_name), date)
        } else {
            new_name.to_string()
        };
        let new_name = resolved.as_str();
        if new_name != name {
            self.ensure_name_free(new_name)?;
        }
        ensure_family(new_type, old.family())?;
        let task = Task::new(new_name, new_type, date, start_time, duration)?;

        self.transaction(|schedule| {
            schedule.transient.remove(name);
            if !old.same_slot(&task) {
                schedule.ensure_no_add_conflict(&task, new_name)?;
            }
            debug!(task = name, new_name, family = "transient", "task edited");
            schedule.transient.insert(new_name.to_string(), task);
            Ok(())
        })
    }

    /// Replace an anti-task with new fields. The type stays `Cancellation`.
    ///
    /// The new anti-task must match a recurring occurrence, and any occurrence the
    /// old one covered must not be left in conflict.
    pub fn edit_anti(
        &mut self,
        name: &str,
        new_name: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<()> {
        let old = self
            .anti
            .get(name)
            .cloned()
            .ok_or_else(|| ScheduleError::NotFound(name.to_string()))?;
        if new_name != name {
            self.ensure_name_free(new_name)?;
        }
        let anti = AntiTask::new(
            new_name,
            TaskType::Cancellation.as_str(),
            date,
            start_time,
            duration,
        )?;

        self.transaction(|schedule| {
            schedule.anti.remove(name);
            if !old.task().same_slot(anti.task()) {
                schedule.ensure_anti_fits(&anti)?;
            }
            schedule.anti.insert(new_name.to_string(), anti);
            if let Some(conflict) = schedule.find_delete_conflict(&old)? {
                return Err(ScheduleError::CancellationMismatch(format!(
                    "moving {} would reopen a conflict with {}",
                    name, conflict
                )));
            }
            debug!(task = name, new_name, family = "anti", "task edited");
            Ok(())
        })
    }

    /// Replace a recurring task with new fields.
    ///
    /// A change of name or type only is a plain rename and keeps every anti-task.
    /// Otherwise anti-tasks that cancelled an occurrence of the old series but
    /// match none of the new one are pruned, and the new series is checked like an
    /// add. On failure nothing changes, pruned anti-tasks included.
    #[allow(clippy::too_many_arguments)]
    pub fn edit_recurring(
        &mut self,
        name: &str,
        new_name: &str,
        new_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
        end_date: u32,
        frequency: u32,
    ) -> Result<()> {
        let old = self
            .recurring
            .get(name)
            .cloned()
            .ok_or_else(|| ScheduleError::NotFound(name.to_string()))?;
        if new_name != name {
            self.ensure_name_free(new_name)?;
        }
        ensure_family(new_type, TaskFamily::Recurring)?;
        let recurring = RecurringTask::new(
            new_name, new_type, date, start_time, duration, end_date, frequency,
        )?;

        self.transaction(|schedule| {
            schedule.recurring.remove(name);
            if !old.same_series(&recurring) {
                let stale: Vec<String> = schedule
                    .anti_tasks_cancelling(&old)
                    .into_iter()
                    .filter(|anti| {
                        schedule.anti[anti]
                            .cancelled_occurrence(&recurring)
                            .is_none()
                    })
                    .collect();
                for anti in &stale {
                    schedule.anti.remove(anti);
                }
                if let Some(conflict) = schedule.find_recurring_conflict(&recurring)? {
                    return Err(ScheduleError::SchedulingConflict(format!(
                        "{} overlaps {}",
                        new_name, conflict
                    )));
                }
                debug!(task = name, pruned = stale.len(), "stale anti-tasks pruned");
            }
            debug!(task = name, new_name, family = "recurring", "task edited");
            schedule.recurring.insert(new_name.to_string(), recurring);
            Ok(())
        })
    }

    // ---------------------------------------------------------------------
    // Range queries
    // ---------------------------------------------------------------------

    /// Every transient task and uncancelled recurring occurrence starting in
    /// `month` (of any year), in chronological order.
    pub fn tasks_by_month(&self, month: u32) -> Result<Vec<Task>> {
        let mut result: Vec<Task> = self
            .transient
            .values()
            .filter(|task| task.month() == month)
            .cloned()
            .collect();

        for recurring in self.recurring.values() {
            for occurrence in recurring.occurrences()? {
                if occurrence.month() == month && !self.has_anti(&occurrence)? {
                    result.push(occurrence);
                }
            }
        }

        result.sort_by(|a, b| a.chronological(b));
        Ok(result)
    }

    /// The subset of [`Schedule::tasks_by_month`] falling on day `day`.
    pub fn tasks_by_day(&self, month: u32, day: u32) -> Result<Vec<Task>> {
        ensure_day(day)?;
        let mut result = self.tasks_by_month(month)?;
        result.retain(|task| task.day() == day);
        Ok(result)
    }

    /// The subset of [`Schedule::tasks_by_month`] in the ISO week containing
    /// `month`/`day`, with the target date taken in each candidate's own year.
    ///
    /// `month`/`day` must exist in some year (Feb 29 does). Candidates from a
    /// year without that date are skipped.
    pub fn tasks_by_week(&self, month: u32, day: u32) -> Result<Vec<Task>> {
        ensure_day(day)?;
        // 2000 is a leap year, so every real month/day exists in it.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(ScheduleError::Validation(format!(
                "{:02}-{:02} is not a date",
                month, day
            )));
        }

        let mut result = Vec::new();
        for task in self.tasks_by_month(month)? {
            let Some(target) = NaiveDate::from_ymd_opt(task.year(), month, day) else {
                continue;
            };
            if iso_week(task.date()) == iso_week(target) {
                result.push(task);
            }
        }
        Ok(result)
    }

    // ---------------------------------------------------------------------
    // Invariant helpers (read-only)
    // ---------------------------------------------------------------------

    /// Whether `name` is used in any collection.
    pub fn has_name_conflict(&self, name: &str) -> bool {
        self.transient.contains_key(name)
            || self.anti.contains_key(name)
            || self.recurring.contains_key(name)
    }

    /// Whether some anti-task cancels `task`.
    pub fn has_anti(&self, task: &Task) -> Result<bool> {
        for anti in self.anti.values() {
            if anti.cancels(task)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// First commitment `task` would collide with, ignoring entries named `skip`.
    ///
    /// Checks every transient task and every recurring occurrence not cancelled
    /// by an anti-task.
    fn find_add_conflict(&self, task: &Task, skip: &str) -> Result<Option<String>> {
        for (name, other) in &self.transient {
            if name != skip && task.overlaps(other)? {
                return Ok(Some(name.clone()));
            }
        }

        for (name, recurring) in &self.recurring {
            if name == skip {
                continue;
            }
            let hits = recurring.overlapping_occurrences(task)?;
            for (label, occurrence) in label_occurrences(&hits).into_iter().zip(&hits) {
                if !self.has_anti(occurrence)? {
                    return Ok(Some(format!(
                        "{} on {}",
                        label,
                        occurrence.date().format("%Y-%m-%d")
                    )));
                }
            }
        }

        Ok(None)
    }

    /// First commitment the series would collide with.
    ///
    /// Occurrences overlapping a transient task are forgiven when cancelled;
    /// overlaps between two recurring series never are.
    fn find_recurring_conflict(&self, recurring: &RecurringTask) -> Result<Option<String>> {
        for (name, task) in &self.transient {
            for occurrence in recurring.overlapping_occurrences(task)? {
                if !self.has_anti(&occurrence)? {
                    return Ok(Some(format!(
                        "{} (occurrence on {})",
                        name,
                        occurrence.date().format("%Y-%m-%d")
                    )));
                }
            }
        }

        for (name, other) in &self.recurring {
            if name != recurring.name() && recurring.overlaps_recurring(other)? {
                return Ok(Some(name.clone()));
            }
        }

        Ok(None)
    }

    /// With `anti` already gone, the first commitment an occurrence it used to
    /// cancel now collides with. Occurrences still cancelled by another anti-task
    /// are skipped.
    fn find_delete_conflict(&self, anti: &AntiTask) -> Result<Option<String>> {
        for recurring in self.recurring.values() {
            let Some(occurrence) = anti.cancelled_occurrence(recurring) else {
                continue;
            };
            if self.has_anti(&occurrence)? {
                continue;
            }
            if let Some(conflict) = self.find_add_conflict(&occurrence, recurring.name())? {
                return Ok(Some(conflict));
            }
        }
        Ok(None)
    }

    /// Names of anti-tasks cancelling an occurrence of `recurring`.
    fn anti_tasks_cancelling(&self, recurring: &RecurringTask) -> Vec<String> {
        self.anti
            .iter()
            .filter(|(_, anti)| anti.cancelled_occurrence(recurring).is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn ensure_name_free(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ScheduleError::Validation("name cannot be empty".to_string()));
        }
        if self.has_name_conflict(name) {
            return Err(ScheduleError::NameConflict(name.to_string()));
        }
        Ok(())
    }

    fn ensure_no_add_conflict(&self, task: &Task, skip: &str) -> Result<()> {
        if let Some(conflict) = self.find_add_conflict(task, skip)? {
            return Err(ScheduleError::SchedulingConflict(format!(
                "{} overlaps {}",
                task.name(),
                conflict
            )));
        }
        Ok(())
    }

    /// An anti-task may not overlap another one and must cancel some occurrence.
    fn ensure_anti_fits(&self, anti: &AntiTask) -> Result<()> {
        for (name, other) in &self.anti {
            if other.task().overlaps(anti.task())? {
                return Err(ScheduleError::SchedulingConflict(format!(
                    "{} overlaps anti-task {}",
                    anti.name(),
                    name
                )));
            }
        }

        let matches_occurrence = self
            .recurring
            .values()
            .any(|recurring| anti.cancelled_occurrence(recurring).is_some());
        if !matches_occurrence {
            return Err(ScheduleError::CancellationMismatch(format!(
                "{} does not match any recurring occurrence",
                anti.name()
            )));
        }
        Ok(())
    }

    /// Run `op` against the schedule, restoring the prior state if it fails.
    fn transaction<T>(
        &mut self,
        op: impl FnOnce(&mut Schedule) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.clone();
        let outcome = op(self);
        if outcome.is_err() {
            *self = snapshot;
        }
        outcome
    }
}

fn ensure_family(task_type: &str, family: TaskFamily) -> Result<()> {
    let parsed: TaskType = task_type.parse()?;
    if parsed.family() != family {
        return Err(ScheduleError::Validation(format!(
            "{:?} is not a {} type",
            task_type, family
        )));
    }
    Ok(())
}

/// `name` with the `" (YYYY-MM-DD)"` suffix every stored subtask carries.
fn subtask_name(name: &str, date: u32) -> String {
    let suffix = format!(" ({})", date_to_string(date));
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

fn ensure_day(day: u32) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(ScheduleError::Validation(format!("bad day {}", day)));
    }
    Ok(())
}
