//! `pss` CLI: manage a personal schedule from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Interactive menu over a schedule file
//! pss --file schedule.json
//!
//! # Print the tasks on 2020-04-16 (month/day, any year)
//! pss --file schedule.json show --month 4 --day 16
//!
//! # Export the ISO week containing April 14th as JSON
//! pss --file schedule.json show --month 4 --day 14 --week -o week.json
//!
//! # Validate a schedule file
//! pss --file schedule.json check
//!
//! # Settings from a TOML file
//! pss --config pss.toml
//! ```

mod config;
mod input;
mod menu;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pss_core::{write_task_list, Schedule};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::menu::Menu;

#[derive(Parser)]
#[command(name = "pss", version, about = "Personal schedule manager")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schedule file (overrides `schedule_file` from the config)
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (the default)
    Menu,
    /// Print or export the tasks in a month, week or day
    Show {
        /// Month (1-12)
        #[arg(short, long)]
        month: u32,
        /// Day of the month; restricts the result to that day
        #[arg(short, long)]
        day: Option<u32>,
        /// With --day, show the whole ISO week containing that day
        #[arg(short, long, requires = "day")]
        week: bool,
        /// Write the tasks as JSON to this file instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load the schedule file and report what it holds
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    if cli.file.is_some() {
        config.schedule_file = cli.file.clone();
    }

    // Logs go to stderr so they never mix with menu or `show` output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => run_menu(&config),
        Commands::Show {
            month,
            day,
            week,
            output,
        } => run_show(&config, month, day, week, output.as_deref()),
        Commands::Check => run_check(&config),
    }
}

fn run_menu(config: &CliConfig) -> Result<()> {
    let mut schedule = Schedule::new();
    if let Some(path) = &config.schedule_file {
        if path.exists() {
            load(&mut schedule, path)?;
        } else {
            warn!(path = %path.display(), "schedule file not found, starting empty");
        }
    }

    let autosave = if config.autosave {
        config.schedule_file.clone()
    } else {
        None
    };
    let stdin = io::stdin();
    Menu::new(stdin.lock(), io::stdout().lock(), schedule)
        .with_autosave(autosave)
        .run()?;
    Ok(())
}

fn run_show(
    config: &CliConfig,
    month: u32,
    day: Option<u32>,
    week: bool,
    output: Option<&Path>,
) -> Result<()> {
    let schedule = load_required(config)?;
    let tasks = match (day, week) {
        (Some(day), true) => schedule.tasks_by_week(month, day)?,
        (Some(day), false) => schedule.tasks_by_day(month, day)?,
        (None, _) => schedule.tasks_by_month(month)?,
    };

    match output {
        Some(path) => {
            write_task_list(path, &tasks)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            println!("Wrote {} tasks to {}", tasks.len(), path.display());
        }
        None if tasks.is_empty() => println!("No tasks found."),
        None => {
            for task in &tasks {
                println!("{}", task);
            }
        }
    }
    Ok(())
}

fn run_check(config: &CliConfig) -> Result<()> {
    let schedule = load_required(config)?;
    println!("transient: {}", schedule.transient_tasks().count());
    println!("anti: {}", schedule.anti_tasks().count());
    println!("recurring: {}", schedule.recurring_tasks().count());
    Ok(())
}

fn load_required(config: &CliConfig) -> Result<Schedule> {
    let Some(path) = &config.schedule_file else {
        bail!("no schedule file given (use --file or set schedule_file in the config)");
    };
    let mut schedule = Schedule::new();
    load(&mut schedule, path)?;
    Ok(schedule)
}

fn load(schedule: &mut Schedule, path: &Path) -> Result<()> {
    schedule
        .load_file(path)
        .with_context(|| format!("Failed to load schedule: {}", path.display()))?;
    info!(path = %path.display(), tasks = schedule.len(), "schedule ready");
    Ok(())
}
