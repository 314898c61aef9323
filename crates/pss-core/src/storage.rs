//! JSON load/save for schedules.
//!
//! A schedule file is a top-level JSON array of flat objects in one of two shapes:
//!
//! - 5 keys, for transient tasks, anti-tasks and standalone recurring occurrences:
//!   `{"Name", "Type", "Date", "StartTime", "Duration"}`
//! - 7 keys, for recurring tasks (note `StartDate`, not `Date`):
//!   `{"Name", "Type", "StartDate", "StartTime", "Duration", "EndDate", "Frequency"}`
//!
//! Loading is all-or-nothing: entries are applied to a scratch copy in dependency
//! order (recurring, then anti, then transient and occurrences) and the copy only
//! replaces the schedule once every entry has been accepted.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::anti_task::AntiTask;
use crate::error::{Result, ScheduleError};
use crate::recurring::RecurringTask;
use crate::schedule::Schedule;
use crate::task::{Task, TaskFamily, TaskType};

const TASK_KEYS: usize = 5;
const RECURRING_KEYS: usize = 7;
const TYPE_KEY: &str = "Type";

/// The 5-key shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskRecord {
    name: String,
    #[serde(rename = "Type")]
    task_type: String,
    date: u32,
    start_time: f64,
    duration: f64,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            task_type: task.task_type().as_str().to_string(),
            date: task.date_int(),
            start_time: task.start_time(),
            duration: task.duration(),
        }
    }
}

/// The 7-key shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecurringRecord {
    name: String,
    #[serde(rename = "Type")]
    task_type: String,
    start_date: u32,
    start_time: f64,
    duration: f64,
    end_date: u32,
    frequency: u32,
}

impl From<&RecurringTask> for RecurringRecord {
    fn from(recurring: &RecurringTask) -> Self {
        let task = recurring.task();
        Self {
            name: task.name().to_string(),
            task_type: task.task_type().as_str().to_string(),
            start_date: task.date_int(),
            start_time: task.start_time(),
            duration: task.duration(),
            end_date: recurring.end_date_int(),
            frequency: recurring.frequency(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Record {
    Task(TaskRecord),
    Recurring(RecurringRecord),
}

/// File entries partitioned by the order in which they must be applied.
#[derive(Debug, Default)]
struct LoadPlan {
    recurring: Vec<RecurringRecord>,
    anti: Vec<TaskRecord>,
    transient: Vec<TaskRecord>,
    subtasks: Vec<TaskRecord>,
}

impl LoadPlan {
    fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(entries) = value else {
            return Err(ScheduleError::File(
                "top level must be an array of tasks".to_string(),
            ));
        };

        let mut plan = LoadPlan::default();
        for (index, entry) in entries.into_iter().enumerate() {
            let Value::Object(map) = entry else {
                return Err(ScheduleError::File(format!(
                    "entry {} is not an object",
                    index
                )));
            };
            match map.len() {
                TASK_KEYS => {
                    let family = entry_family(index, &map)?;
                    let record: TaskRecord = decode(index, map)?;
                    match family {
                        TaskFamily::Transient => plan.transient.push(record),
                        TaskFamily::Anti => plan.anti.push(record),
                        TaskFamily::Recurring => plan.subtasks.push(record),
                    }
                }
                RECURRING_KEYS => {
                    entry_family(index, &map)?;
                    plan.recurring.push(decode(index, map)?);
                }
                n => {
                    return Err(ScheduleError::File(format!(
                        "entry {} has {} keys (expected {} or {})",
                        index, n, TASK_KEYS, RECURRING_KEYS
                    )))
                }
            }
        }
        Ok(plan)
    }

    fn apply(self, schedule: &mut Schedule) -> Result<()> {
        for r in self.recurring {
            schedule.add_recurring(
                &r.name,
                &r.task_type,
                r.start_date,
                r.start_time,
                r.duration,
                r.end_date,
                r.frequency,
            )?;
        }
        for a in self.anti {
            schedule.add_anti(&a.name, &a.task_type, a.date, a.start_time, a.duration)?;
        }
        for t in self.transient {
            schedule.add_transient(&t.name, &t.task_type, t.date, t.start_time, t.duration)?;
        }
        for s in self.subtasks {
            schedule.add_subtask(&s.name, &s.task_type, s.date, s.start_time, s.duration)?;
        }
        Ok(())
    }
}

/// Family of an entry, read from its `Type` value. An unknown type is
/// malformed file content.
fn entry_family(index: usize, map: &Map<String, Value>) -> Result<TaskFamily> {
    let raw = map
        .get(TYPE_KEY)
        .ok_or_else(|| ScheduleError::File(format!("entry {}: missing \"Type\" key", index)))?;
    let name = raw.as_str().ok_or_else(|| {
        ScheduleError::File(format!("entry {}: \"Type\" is not a string", index))
    })?;
    let task_type: TaskType = name
        .parse()
        .map_err(|_| ScheduleError::File(format!("entry {}: bad type {:?}", index, name)))?;
    Ok(task_type.family())
}

fn decode<T: DeserializeOwned>(index: usize, map: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ScheduleError::File(format!("entry {}: {}", index, e)))
}

impl Schedule {
    /// Merge the tasks described by `json` into the schedule.
    ///
    /// # Errors
    /// `File` or `Json` for malformed content; otherwise the error of the first
    /// rejected entry. In every error case the schedule is left untouched.
    pub fn load_str(&mut self, json: &str) -> Result<()> {
        let plan = LoadPlan::parse(json)?;
        let mut scratch = self.clone();
        plan.apply(&mut scratch)?;
        *self = scratch;
        Ok(())
    }

    /// Read a schedule file and merge it in, as [`Schedule::load_str`].
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.len();
        self.load_str(&json)?;
        info!(
            path = %path.display(),
            loaded = self.len() - before,
            "schedule file loaded"
        );
        Ok(())
    }

    /// Pretty-printed JSON for the whole schedule: transient tasks, anti-tasks,
    /// then recurring tasks.
    pub fn to_json(&self) -> Result<String> {
        let mut records: Vec<Record> = self
            .transient_tasks()
            .map(|t| Record::Task(t.into()))
            .collect();
        records.extend(
            self.anti_tasks()
                .map(AntiTask::task)
                .map(|t| Record::Task(t.into())),
        );
        records.extend(
            self.recurring_tasks()
                .map(|r| Record::Recurring(r.into())),
        );
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Write the whole schedule to `path`, replacing any existing file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_json(path, &self.to_json()?)?;
        info!(path = %path.display(), tasks = self.len(), "schedule file written");
        Ok(())
    }
}

/// Pretty-printed JSON for a task list, every entry in the 5-key shape.
pub fn tasks_to_json(tasks: &[Task]) -> Result<String> {
    let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Write a task list (typically a range-query result) to `path`.
pub fn write_task_list(path: impl AsRef<Path>, tasks: &[Task]) -> Result<()> {
    let path = path.as_ref();
    write_json(path, &tasks_to_json(tasks)?)?;
    info!(path = %path.display(), tasks = tasks.len(), "task list written");
    Ok(())
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, json).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })
}
