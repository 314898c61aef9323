//! Integration tests for the `pss` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the menu, show and
//! check commands through the actual binary, including stdin scripting, config
//! files, JSON export and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to a schedule fixture shared with the core crate.
fn fixture(name: &str) -> String {
    format!(
        "{}/{}",
        concat!(env!("CARGO_MANIFEST_DIR"), "/../pss-core/tests/fixtures"),
        name
    )
}

fn pss() -> Command {
    let mut cmd = Command::cargo_bin("pss").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_reports_family_counts() {
    pss()
        .args(["--file", &fixture("week.json"), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("transient: 3"))
        .stdout(predicate::str::contains("anti: 1"))
        .stdout(predicate::str::contains("recurring: 2"));
}

#[test]
fn check_rejects_conflicting_file() {
    pss()
        .args(["--file", &fixture("conflicting.json"), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scheduling conflict"));
}

#[test]
fn check_rejects_orphan_anti_task() {
    pss()
        .args(["--file", &fixture("orphan_anti.json"), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cancellation mismatch"));
}

#[test]
fn check_without_file_fails() {
    pss()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no schedule file given"));
}

#[test]
fn check_reads_file_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("pss.toml");
    std::fs::write(
        &config,
        format!("schedule_file = {:?}\n", fixture("base.json")),
    )
    .unwrap();

    pss()
        .args(["--config", config.to_str().unwrap(), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recurring: 1"));
}

#[test]
fn file_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("pss.toml");
    std::fs::write(
        &config,
        format!("schedule_file = {:?}\n", fixture("conflicting.json")),
    )
    .unwrap();

    pss()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--file",
            &fixture("base.json"),
            "check",
        ])
        .assert()
        .success();
}

#[test]
fn bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("pss.toml");
    std::fs::write(&config, "autosave = \"sometimes\"\n").unwrap();

    pss()
        .args(["--config", config.to_str().unwrap(), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// show
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn show_day_prints_tasks() {
    pss()
        .args(["--file", &fixture("week.json"), "show", "--month", "4", "--day", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: Late Movie"))
        .stdout(predicate::str::contains("Name: Sleep"))
        .stdout(predicate::str::contains("CS3560-Tu").not());
}

#[test]
fn show_cancelled_day_is_empty() {
    pss()
        .args(["--file", &fixture("week.json"), "show", "--month", "4", "--day", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn show_week_exports_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("week.json");

    pss()
        .args([
            "--file",
            &fixture("week.json"),
            "show",
            "--month",
            "4",
            "--day",
            "14",
            "--week",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 8 tasks"));

    let content = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 8);
    assert!(entries.iter().all(|e| e.get("Date").is_some()));
}

#[test]
fn show_week_requires_day() {
    pss()
        .args(["--file", &fixture("week.json"), "show", "--month", "4", "--week"])
        .assert()
        .failure();
}

#[test]
fn show_rejects_bad_day() {
    pss()
        .args(["--file", &fixture("week.json"), "show", "--month", "4", "--day", "40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad day 40"));
}

// ─────────────────────────────────────────────────────────────────────────────
// menu
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn menu_is_the_default_command() {
    pss()
        .write_stdin("quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to PSS!"))
        .stdout(predicate::str::contains("1. Create a task"));
}

#[test]
fn menu_runs_holiday_scenario() {
    let script = concat!(
        "1\n2\nBad Anti Task\n2020-04-15\n19:00\n1.25\n",
        "1\n2\nHoliday\n2020-04-21\n19:00\n1.25\n",
        "1\n1\nPooping\nVisit\n2020-04-21\n19:00\n1\n",
        "7\n4\n21\n",
        "quit\n"
    );

    pss()
        .args(["--file", &fixture("base.json"), "menu"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: cancellation mismatch"))
        .stdout(predicate::str::contains("Name: Pooping"));
}

#[test]
fn menu_reports_bad_options() {
    pss()
        .write_stdin("seven\n99\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: bad option"))
        .stdout(predicate::str::contains("Error: input out of range"));
}

#[test]
fn menu_starts_empty_when_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("new.json");

    pss()
        .args(["--file", missing.to_str().unwrap()])
        .write_stdin("4\nCS3560-Tu\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: task not found: CS3560-Tu"));
}

#[test]
fn menu_autosaves_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let schedule = dir.path().join("schedule.json");
    std::fs::copy(fixture("week.json"), &schedule).unwrap();
    let config = dir.path().join("pss.toml");
    std::fs::write(
        &config,
        format!("schedule_file = {:?}\nautosave = true\n", schedule),
    )
    .unwrap();

    pss()
        .args(["--config", config.to_str().unwrap()])
        .write_stdin("2\nLate Movie\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success!"))
        .stdout(predicate::str::contains("Schedule saved to"));

    let saved = std::fs::read_to_string(&schedule).unwrap();
    assert!(!saved.contains("Late Movie"));
    assert!(saved.contains("Skip Sleep"));
}
