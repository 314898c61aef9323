//! The base schedulable entity and the closed task-type taxonomy.
//!
//! A [`Task`] is an immutable, validated record: a name, a type, a calendar date,
//! a start time and a duration (both in fractional hours). Edits elsewhere in the
//! crate are modelled as delete-then-reinsert, never as field mutation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::calendar::{self, date_to_int, format_hours, hours_between, int_to_date};
use crate::error::{Result, ScheduleError};

pub(crate) const SEPARATOR: &str = "--------------------------------";

/// Which schedule collection a task type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskFamily {
    /// One-off commitments.
    Transient,
    /// Cancellations of a single recurring occurrence.
    Anti,
    /// Commitments repeating every N days.
    Recurring,
}

impl fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskFamily::Transient => "transient",
            TaskFamily::Anti => "anti",
            TaskFamily::Recurring => "recurring",
        };
        f.write_str(name)
    }
}

/// Every task type the schedule recognises. The type alone decides the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Visit,
    Shopping,
    Appointment,
    Cancellation,
    Class,
    Study,
    Sleep,
    Exercise,
    Work,
    Meal,
}

impl TaskType {
    pub const TRANSIENT: [TaskType; 3] =
        [TaskType::Visit, TaskType::Shopping, TaskType::Appointment];
    pub const RECURRING: [TaskType; 6] = [
        TaskType::Class,
        TaskType::Study,
        TaskType::Sleep,
        TaskType::Exercise,
        TaskType::Work,
        TaskType::Meal,
    ];

    pub fn family(self) -> TaskFamily {
        match self {
            TaskType::Visit | TaskType::Shopping | TaskType::Appointment => TaskFamily::Transient,
            TaskType::Cancellation => TaskFamily::Anti,
            TaskType::Class
            | TaskType::Study
            | TaskType::Sleep
            | TaskType::Exercise
            | TaskType::Work
            | TaskType::Meal => TaskFamily::Recurring,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Visit => "Visit",
            TaskType::Shopping => "Shopping",
            TaskType::Appointment => "Appointment",
            TaskType::Cancellation => "Cancellation",
            TaskType::Class => "Class",
            TaskType::Study => "Study",
            TaskType::Sleep => "Sleep",
            TaskType::Exercise => "Exercise",
            TaskType::Work => "Work",
            TaskType::Meal => "Meal",
        }
    }
}

impl FromStr for TaskType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s {
            "Visit" => TaskType::Visit,
            "Shopping" => TaskType::Shopping,
            "Appointment" => TaskType::Appointment,
            "Cancellation" => TaskType::Cancellation,
            "Class" => TaskType::Class,
            "Study" => TaskType::Study,
            "Sleep" => TaskType::Sleep,
            "Exercise" => TaskType::Exercise,
            "Work" => TaskType::Work,
            "Meal" => TaskType::Meal,
            other => {
                return Err(ScheduleError::Validation(format!(
                    "unrecognized type {:?}",
                    other
                )))
            }
        };
        Ok(parsed)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated commitment.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: String,
    task_type: TaskType,
    date: NaiveDate,
    start_time: f64,
    duration: f64,
}

impl Task {
    /// Build a validated task.
    ///
    /// `date` is a `YYYYMMDD` integer; `start_time` and `duration` are fractional
    /// hours in `[0, 23.75]`. The duration is rounded to the nearest quarter hour
    /// after the bounds check.
    ///
    /// # Errors
    /// Returns `ScheduleError::Validation` for an empty name, an unrecognized type,
    /// an out-of-range start time or duration, or a date that does not exist.
    pub fn new(
        name: impl Into<String>,
        task_type: &str,
        date: u32,
        start_time: f64,
        duration: f64,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ScheduleError::Validation("name cannot be empty".to_string()));
        }
        let task_type: TaskType = task_type.parse()?;
        calendar::validate_hours(start_time, "start time")?;
        calendar::validate_hours(duration, "duration")?;
        let date = int_to_date(date)?;

        Ok(Self {
            name,
            task_type,
            date,
            start_time,
            duration: calendar::round_to_quarter(duration),
        })
    }

    /// The same commitment moved to `date`, keeping name, type and times.
    pub(crate) fn with_date(&self, date: NaiveDate) -> Task {
        Task {
            date,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn family(&self) -> TaskFamily {
        self.task_type.family()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date as a `YYYYMMDD` integer.
    pub fn date_int(&self) -> u32 {
        date_to_int(self.date)
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Absolute start instant.
    pub fn start(&self) -> Result<NaiveDateTime> {
        calendar::instant(self.date, self.start_time)
    }

    /// Absolute end instant (start plus duration).
    pub fn end(&self) -> Result<NaiveDateTime> {
        calendar::instant(self.date, self.start_time + self.duration)
    }

    /// Whether `self` and `other` occupy the same date, start time and duration.
    pub fn same_slot(&self, other: &Task) -> bool {
        self.date == other.date
            && self.start_time == other.start_time
            && self.duration == other.duration
    }

    /// Whether the two intervals share any instant.
    ///
    /// With `delta` the distance in hours between the two starts, the tasks overlap
    /// iff `delta` is strictly less than the duration of the task that starts first.
    /// Touching endpoints do not overlap. When both start at the same instant the
    /// longer duration decides, so the relation is symmetric.
    pub fn overlaps(&self, other: &Task) -> Result<bool> {
        let ours = self.start()?;
        let theirs = other.start()?;
        let delta = hours_between(ours, theirs).abs();

        let earlier_duration = match ours.cmp(&theirs) {
            Ordering::Less => self.duration,
            Ordering::Greater => other.duration,
            Ordering::Equal => self.duration.max(other.duration),
        };
        Ok(delta < earlier_duration)
    }

    /// Strictly earlier on `(date, start_time)`.
    pub fn before(&self, other: &Task) -> bool {
        if self.date == other.date {
            return self.start_time < other.start_time;
        }
        self.date < other.date
    }

    /// Chronological ordering built on [`Task::before`], for sorting query results.
    pub fn chronological(&self, other: &Task) -> Ordering {
        if self.before(other) {
            Ordering::Less
        } else if other.before(self) {
            Ordering::Greater
        } else {
            self.name.cmp(&other.name)
        }
    }

    pub(crate) fn write_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Type: {}", self.task_type)?;
        writeln!(f, "Start Date: {}", self.date.format("%Y-%m-%d"))?;
        writeln!(f, "Start Time: {}", format_hours(self.start_time))?;
        write!(f, "Duration: {}", self.duration)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;
        self.write_fields(f)?;
        write!(f, "\n{}", SEPARATOR)
    }
}

/// Anything that can report which of its concrete occurrences intersect a task.
///
/// A single [`Task`] is its own only occurrence; a
/// [`RecurringTask`](crate::recurring::RecurringTask) answers without expanding
/// its whole series.
pub trait Overlappable {
    /// Occurrences of `self` whose interval overlaps `task`, in date order.
    fn overlapping_occurrences(&self, task: &Task) -> Result<Vec<Task>>;
}

/// Something that can nullify the interval of a task.
pub trait Cancellable {
    /// Whether `task` is cancelled by `self`.
    fn cancels(&self, task: &Task) -> Result<bool>;
}

/// A series that expands into concrete occurrences.
pub trait Recurring {
    /// Every occurrence of the series, in date order.
    fn occurrences(&self) -> Result<Vec<Task>>;
}

impl Overlappable for Task {
    fn overlapping_occurrences(&self, task: &Task) -> Result<Vec<Task>> {
        if self.overlaps(task)? {
            Ok(vec![self.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Display labels for a list of occurrences of the same series.
///
/// A lone occurrence keeps its plain name; several are numbered `"Name (1)"`,
/// `"Name (2)"`, ... in list order. The tasks themselves are left untouched.
pub fn label_occurrences(occurrences: &[Task]) -> Vec<String> {
    if occurrences.len() <= 1 {
        return occurrences.iter().map(|t| t.name.clone()).collect();
    }
    occurrences
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{} ({})", t.name, i + 1))
        .collect()
}
