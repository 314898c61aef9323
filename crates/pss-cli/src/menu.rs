//! The interactive numbered menu.
//!
//! The menu reads one line per prompt from any [`BufRead`] and writes to any
//! [`Write`], so the binary drives it with stdin/stdout and the tests with
//! byte buffers.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use pss_core::{write_task_list, Schedule, ScheduleError, ScheduledTask, Task, TaskFamily, TaskType};
use tracing::{debug, info};

use crate::input::{parse_date, parse_hours, parse_number, parse_time};

/// Typed at the option prompt to leave the menu.
pub const ESCAPE: &str = "quit";

const BANNER: &str = "==================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Create,
    Delete,
    Edit,
    View,
    ViewMonth,
    ViewWeek,
    ViewDay,
    Read,
    Write,
    WriteMonth,
    WriteWeek,
    WriteDay,
}

impl MenuOption {
    const ALL: [MenuOption; 12] = [
        MenuOption::Create,
        MenuOption::Delete,
        MenuOption::Edit,
        MenuOption::View,
        MenuOption::ViewMonth,
        MenuOption::ViewWeek,
        MenuOption::ViewDay,
        MenuOption::Read,
        MenuOption::Write,
        MenuOption::WriteMonth,
        MenuOption::WriteWeek,
        MenuOption::WriteDay,
    ];

    fn title(self) -> &'static str {
        match self {
            MenuOption::Create => "Create a task",
            MenuOption::Delete => "Delete a task",
            MenuOption::Edit => "Edit a task",
            MenuOption::View => "View a task",
            MenuOption::ViewMonth => "View by month",
            MenuOption::ViewWeek => "View by week",
            MenuOption::ViewDay => "View by day",
            MenuOption::Read => "Read schedule from file",
            MenuOption::Write => "Write schedule to file",
            MenuOption::WriteMonth => "Write month to file",
            MenuOption::WriteWeek => "Write week to file",
            MenuOption::WriteDay => "Write day to file",
        }
    }
}

/// Which range query a view or export runs.
#[derive(Debug, Clone, Copy)]
enum Range {
    Month,
    Week,
    Day,
}

/// Fields shared by every kind of task entered at the prompts.
struct TaskFields {
    name: String,
    task_type: String,
    date: u32,
    start_time: f64,
    duration: f64,
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    schedule: Schedule,
    autosave: Option<PathBuf>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, schedule: Schedule) -> Self {
        Self {
            input,
            output,
            schedule,
            autosave: None,
        }
    }

    /// Write the schedule to `path` when the menu exits.
    pub fn with_autosave(mut self, path: Option<PathBuf>) -> Self {
        self.autosave = path;
        self
    }

    /// Serve options until [`ESCAPE`] or end of input, then hand the
    /// schedule back.
    pub fn run(mut self) -> Result<Schedule> {
        self.display()?;
        while let Some(line) = self.read_line()? {
            if line == ESCAPE {
                break;
            }
            let Ok(choice) = line.parse::<usize>() else {
                writeln!(self.output, "Error: bad option")?;
                self.display()?;
                continue;
            };
            match self.process(choice) {
                Ok(()) => writeln!(self.output, "Success!")?,
                Err(e) => writeln!(self.output, "Error: {:#}", e)?,
            }
            self.display()?;
        }

        if let Some(path) = &self.autosave {
            self.schedule.write_file(path)?;
            writeln!(self.output, "Schedule saved to {}", path.display())?;
        }
        Ok(self.schedule)
    }

    fn display(&mut self) -> Result<()> {
        writeln!(self.output, "{}", BANNER)?;
        writeln!(self.output, "Welcome to PSS!")?;
        writeln!(self.output, "Enter {:?} to quit", ESCAPE)?;
        writeln!(self.output, "{}", BANNER)?;
        for (i, option) in MenuOption::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option.title())?;
        }
        write!(self.output, "\nEnter an option: ")?;
        self.output.flush()?;
        Ok(())
    }

    fn process(&mut self, choice: usize) -> Result<()> {
        let Some(&option) = choice
            .checked_sub(1)
            .and_then(|i| MenuOption::ALL.get(i))
        else {
            bail!("input out of range");
        };
        debug!(option = option.title(), "menu option selected");

        match option {
            MenuOption::Create => self.create(),
            MenuOption::Delete => {
                let name = self.prompt("Enter task name: ")?;
                Ok(self.schedule.delete_task(&name)?)
            }
            MenuOption::Edit => self.edit(),
            MenuOption::View => self.view_task(),
            MenuOption::ViewMonth => self.view_range(Range::Month),
            MenuOption::ViewWeek => self.view_range(Range::Week),
            MenuOption::ViewDay => self.view_range(Range::Day),
            MenuOption::Read => {
                let path = self.prompt("Enter file name: ")?;
                self.schedule.load_file(&path)?;
                info!(path = %path, "schedule read from menu");
                Ok(())
            }
            MenuOption::Write => {
                let path = self.prompt("Enter file name: ")?;
                Ok(self.schedule.write_file(&path)?)
            }
            MenuOption::WriteMonth => self.write_range(Range::Month),
            MenuOption::WriteWeek => self.write_range(Range::Week),
            MenuOption::WriteDay => self.write_range(Range::Day),
        }
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    fn create(&mut self) -> Result<()> {
        writeln!(self.output, "Select the type of task to add")?;
        writeln!(self.output, "1. Transient task")?;
        writeln!(self.output, "2. Anti task")?;
        writeln!(self.output, "3. Recurring task")?;
        let mut choice = self.prompt("Enter an option: ")?;
        loop {
            match choice.as_str() {
                "1" => {
                    let f = self.request_task(TaskFamily::Transient)?;
                    return Ok(self.schedule.add_transient(
                        &f.name,
                        &f.task_type,
                        f.date,
                        f.start_time,
                        f.duration,
                    )?);
                }
                "2" => {
                    let f = self.request_anti()?;
                    return Ok(self.schedule.add_anti(
                        &f.name,
                        &f.task_type,
                        f.date,
                        f.start_time,
                        f.duration,
                    )?);
                }
                "3" => {
                    let (f, end_date, frequency) = self.request_recurring()?;
                    return Ok(self.schedule.add_recurring(
                        &f.name,
                        &f.task_type,
                        f.date,
                        f.start_time,
                        f.duration,
                        end_date,
                        frequency,
                    )?);
                }
                _ => choice = self.prompt("Invalid option. Try again: ")?,
            }
        }
    }

    fn edit(&mut self) -> Result<()> {
        let name = self.prompt("Enter the name of the task to edit: ")?;
        let Some(existing) = self.schedule.get(&name) else {
            return Err(ScheduleError::NotFound(name).into());
        };

        match existing {
            ScheduledTask::Transient(task) => {
                // Stored occurrences keep their recurring type family.
                let f = self.request_task(task.family())?;
                self.schedule.edit_transient(
                    &name,
                    &f.name,
                    &f.task_type,
                    f.date,
                    f.start_time,
                    f.duration,
                )?;
            }
            ScheduledTask::Anti(_) => {
                let f = self.request_anti()?;
                self.schedule
                    .edit_anti(&name, &f.name, f.date, f.start_time, f.duration)?;
            }
            ScheduledTask::Recurring(_) => {
                let (f, end_date, frequency) = self.request_recurring()?;
                self.schedule.edit_recurring(
                    &name,
                    &f.name,
                    &f.task_type,
                    f.date,
                    f.start_time,
                    f.duration,
                    end_date,
                    frequency,
                )?;
            }
        }
        Ok(())
    }

    fn view_task(&mut self) -> Result<()> {
        let name = self.prompt("Enter a task name: ")?;
        match self.schedule.get(&name) {
            Some(task) => {
                writeln!(self.output, "{}", task)?;
                Ok(())
            }
            None => Err(ScheduleError::NotFound(name).into()),
        }
    }

    fn view_range(&mut self, range: Range) -> Result<()> {
        let tasks = self.query(range)?;
        if tasks.is_empty() {
            writeln!(self.output, "No tasks found.")?;
        }
        for task in &tasks {
            writeln!(self.output, "{}", task)?;
        }
        Ok(())
    }

    fn write_range(&mut self, range: Range) -> Result<()> {
        let tasks = self.query(range)?;
        let path = self.prompt("Enter file name: ")?;
        write_task_list(&path, &tasks)?;
        Ok(())
    }

    fn query(&mut self, range: Range) -> Result<Vec<Task>> {
        let month = parse_number(&self.prompt("Enter a month (1-12): ")?, "month")?;
        let tasks = match range {
            Range::Month => self.schedule.tasks_by_month(month)?,
            Range::Week => {
                let day = parse_number(&self.prompt("Enter a day (1-31): ")?, "day")?;
                self.schedule.tasks_by_week(month, day)?
            }
            Range::Day => {
                let day = parse_number(&self.prompt("Enter a day (1-31): ")?, "day")?;
                self.schedule.tasks_by_day(month, day)?
            }
        };
        Ok(tasks)
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    fn request_task(&mut self, family: TaskFamily) -> Result<TaskFields> {
        let name = self.prompt("Enter task name: ")?;
        writeln!(self.output, "Available types...")?;
        let types: &[TaskType] = match family {
            TaskFamily::Recurring => &TaskType::RECURRING,
            _ => &TaskType::TRANSIENT,
        };
        for t in types {
            writeln!(self.output, "{}", t)?;
        }
        let task_type = self.prompt("Enter task type: ")?;
        let (date, start_time, duration) = self.request_slot()?;
        Ok(TaskFields {
            name,
            task_type,
            date,
            start_time,
            duration,
        })
    }

    fn request_anti(&mut self) -> Result<TaskFields> {
        let name = self.prompt("Enter task name: ")?;
        let (date, start_time, duration) = self.request_slot()?;
        Ok(TaskFields {
            name,
            task_type: TaskType::Cancellation.to_string(),
            date,
            start_time,
            duration,
        })
    }

    fn request_recurring(&mut self) -> Result<(TaskFields, u32, u32)> {
        let fields = self.request_task(TaskFamily::Recurring)?;
        let end_date = parse_date(&self.prompt("Enter end date (eg. 2020-11-14): ")?)?;
        let frequency = parse_number(&self.prompt("Enter frequency (1-7): ")?, "frequency")?;
        Ok((fields, end_date, frequency))
    }

    fn request_slot(&mut self) -> Result<(u32, f64, f64)> {
        let date = parse_date(&self.prompt("Enter date (eg. 2020-11-14): ")?)?;
        let start_time = parse_time(&self.prompt("Enter start time (eg. 15:30): ")?)?;
        let duration =
            parse_hours(&self.prompt("Enter duration (eg. '8.5' for 8 hours 30 min): ")?)?;
        Ok((date, start_time, duration))
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        match self.read_line()? {
            Some(line) => Ok(line),
            None => bail!("unexpected end of input"),
        }
    }

    /// The next trimmed line, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(schedule: Schedule, script: &str) -> (Schedule, String) {
        let mut output = Vec::new();
        let schedule = Menu::new(script.as_bytes(), &mut output, schedule)
            .run()
            .unwrap();
        (schedule, String::from_utf8(output).unwrap())
    }

    fn with_class() -> Schedule {
        let mut schedule = Schedule::new();
        schedule
            .add_recurring("CS3560-Tu", "Class", 20200414, 19.0, 1.25, 20200505, 7)
            .unwrap();
        schedule
    }

    #[test]
    fn lists_every_option() {
        let (_, output) = run(Schedule::new(), "quit\n");
        assert!(output.contains("1. Create a task"));
        assert!(output.contains("12. Write day to file"));
        assert!(output.contains("Enter \"quit\" to quit"));
    }

    #[test]
    fn rejects_bad_and_out_of_range_options() {
        let (_, output) = run(Schedule::new(), "abc\n0\n13\nquit\n");
        assert!(output.contains("Error: bad option"));
        assert_eq!(output.matches("Error: input out of range").count(), 2);
    }

    #[test]
    fn creates_transient_task() {
        let script = "1\n1\nDentist\nAppointment\n2020-04-20\n9:30\n1\nquit\n";
        let (schedule, output) = run(Schedule::new(), script);
        assert!(output.contains("Success!"));
        assert!(output.contains("Available types...\nVisit\nShopping\nAppointment"));
        let task = schedule.get("Dentist").unwrap();
        assert_eq!(task.task().start_time(), 9.5);
    }

    #[test]
    fn create_retries_unknown_kind() {
        let script = "1\n9\n1\nDentist\nAppointment\n2020-04-20\n9:30\n1\nquit\n";
        let (schedule, output) = run(Schedule::new(), script);
        assert!(output.contains("Invalid option. Try again: "));
        assert!(schedule.get("Dentist").is_some());
    }

    #[test]
    fn creates_recurring_and_anti_tasks() {
        let script = concat!(
            "1\n3\nCS3560-Tu\nClass\n2020-04-14\n19:00\n1.25\n2020-05-05\n7\n",
            "1\n2\nBad Anti Task\n2020-04-15\n19:00\n1.25\n",
            "1\n2\nHoliday\n2020-04-21\n19:00\n1.25\n",
            "1\n1\nPooping\nVisit\n2020-04-21\n19:00\n1\n",
            "quit\n"
        );
        let (schedule, output) = run(Schedule::new(), script);
        assert_eq!(output.matches("Success!").count(), 3);
        assert!(output.contains("Error: cancellation mismatch"));
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn reports_bad_prompt_values() {
        let script = "1\n1\nDentist\nAppointment\n2020-04-20\nnoon\nquit\n";
        let (schedule, output) = run(Schedule::new(), script);
        assert!(output.contains("Error: bad start time entered"));
        assert!(schedule.is_empty());

        let script = "1\n1\nDentist\nAppointment\n2021-02-29\nquit\n";
        let (schedule, output) = run(Schedule::new(), script);
        assert!(output.contains("Error: bad date entered"));
        assert!(schedule.is_empty());
    }

    #[test]
    fn edits_recurring_task() {
        let script = "3\nCS3560-Tu\nCS3560\nClass\n2020-04-14\n18:00\n1.25\n2020-05-05\n7\nquit\n";
        let (schedule, output) = run(with_class(), script);
        assert!(output.contains("Success!"));
        assert!(schedule.get("CS3560-Tu").is_none());
        assert_eq!(schedule.get("CS3560").unwrap().task().start_time(), 18.0);
    }

    #[test]
    fn views_task_and_ranges() {
        let (_, output) = run(with_class(), "4\nCS3560-Tu\n6\n4\n22\n7\n4\n22\n5\n6\nquit\n");
        assert!(output.contains("Frequency: 7"));
        assert!(output.contains("Start Date: 2020-04-21"));
        assert_eq!(output.matches("No tasks found.").count(), 2);
    }

    #[test]
    fn view_unknown_task_is_an_error() {
        let (_, output) = run(with_class(), "4\nNope\n2\nNope\nquit\n");
        assert_eq!(output.matches("Error: task not found: Nope").count(), 2);
    }

    #[test]
    fn end_of_input_mid_prompt_is_reported() {
        let (_, output) = run(Schedule::new(), "2\n");
        assert!(output.contains("Error: unexpected end of input"));
    }

    #[test]
    fn writes_and_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let whole = dir.path().join("schedule.json");
        let month = dir.path().join("april.json");
        let script = format!(
            "9\n{}\n10\n4\n{}\nquit\n",
            whole.display(),
            month.display()
        );
        let (schedule, output) = run(with_class(), &script);
        assert_eq!(output.matches("Success!").count(), 2);

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&month).unwrap()).unwrap();
        assert_eq!(exported.as_array().unwrap().len(), 3);

        let (reloaded, _) = run(Schedule::new(), &format!("8\n{}\nquit\n", whole.display()));
        assert_eq!(reloaded, schedule);
    }

    #[test]
    fn autosaves_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let mut output = Vec::new();
        Menu::new("2\nCS3560-Tu\n".as_bytes(), &mut output, with_class())
            .with_autosave(Some(path.clone()))
            .run()
            .unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved.trim(), "[]");
    }
}
