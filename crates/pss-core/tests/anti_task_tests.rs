//! Tests for anti-task construction and cancellation rules.

use pss_core::{AntiTask, Cancellable, ErrorKind, Recurring, RecurringTask, Task};

fn class_tuesdays() -> RecurringTask {
    RecurringTask::new("CS3560-Tu", "Class", 20200414, 19.0, 1.25, 20200505, 7).unwrap()
}

fn anti(date: u32, start: f64, duration: f64) -> AntiTask {
    AntiTask::new("Holiday", "Cancellation", date, start, duration).unwrap()
}

#[test]
fn requires_cancellation_type() {
    let err = AntiTask::new("Holiday", "Visit", 20200421, 19.0, 1.25).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = AntiTask::new("Holiday", "Nope", 20200421, 19.0, 1.25).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ---------------------------------------------------------------------------
// cancels: containment policy
// ---------------------------------------------------------------------------

#[test]
fn cancels_exact_match() {
    let occurrence = Task::new("CS3560-Tu", "Class", 20200421, 19.0, 1.25).unwrap();
    assert!(anti(20200421, 19.0, 1.25).cancels(&occurrence).unwrap());
}

#[test]
fn cancels_task_contained_in_window() {
    let occurrence = Task::new("CS3560-Tu", "Class", 20200421, 19.0, 1.25).unwrap();
    assert!(anti(20200421, 18.0, 3.0).cancels(&occurrence).unwrap());
    // 18:00 + 2.25h ends exactly when the class does.
    assert!(anti(20200421, 18.0, 2.25).cancels(&occurrence).unwrap());
}

#[test]
fn does_not_cancel_partial_cover() {
    let occurrence = Task::new("CS3560-Tu", "Class", 20200421, 19.0, 1.25).unwrap();
    assert!(!anti(20200421, 18.0, 2.0).cancels(&occurrence).unwrap());
    assert!(!anti(20200421, 19.25, 1.0).cancels(&occurrence).unwrap());
    assert!(!anti(20200414, 19.0, 1.25).cancels(&occurrence).unwrap());
}

// ---------------------------------------------------------------------------
// cancelled_occurrence: exact alignment
// ---------------------------------------------------------------------------

#[test]
fn finds_aligned_occurrence() {
    let occurrence = anti(20200421, 19.0, 1.25)
        .cancelled_occurrence(&class_tuesdays())
        .expect("aligned occurrence");
    assert_eq!(occurrence.name(), "CS3560-Tu");
    assert_eq!(occurrence.date_int(), 20200421);
    assert_eq!(occurrence.start_time(), 19.0);
    assert_eq!(occurrence.duration(), 1.25);
}

#[test]
fn first_occurrence_can_be_cancelled() {
    assert!(anti(20200414, 19.0, 1.25)
        .cancelled_occurrence(&class_tuesdays())
        .is_some());
}

#[test]
fn rejects_wrong_weekday() {
    assert!(anti(20200415, 19.0, 1.25)
        .cancelled_occurrence(&class_tuesdays())
        .is_none());
}

#[test]
fn rejects_mismatched_time_or_duration() {
    let recurring = class_tuesdays();
    assert!(anti(20200421, 19.25, 1.25).cancelled_occurrence(&recurring).is_none());
    assert!(anti(20200421, 19.0, 1.0).cancelled_occurrence(&recurring).is_none());
    // Containing the occurrence is not enough for a match.
    assert!(anti(20200421, 18.0, 3.0).cancelled_occurrence(&recurring).is_none());
}

#[test]
fn rejects_dates_outside_series() {
    let recurring = class_tuesdays();
    assert!(anti(20200407, 19.0, 1.25).cancelled_occurrence(&recurring).is_none());
    // The end date itself is past the last occurrence.
    assert!(anti(20200505, 19.0, 1.25).cancelled_occurrence(&recurring).is_none());
    assert!(anti(20200512, 19.0, 1.25).cancelled_occurrence(&recurring).is_none());
}

#[test]
fn alignment_follows_frequency() {
    let every_other_day =
        RecurringTask::new("Run", "Exercise", 20200414, 7.0, 1.0, 20200430, 2).unwrap();
    let on_cycle = AntiTask::new("Rest", "Cancellation", 20200416, 7.0, 1.0).unwrap();
    let off_cycle = AntiTask::new("Rest", "Cancellation", 20200417, 7.0, 1.0).unwrap();
    assert!(on_cycle.cancelled_occurrence(&every_other_day).is_some());
    assert!(off_cycle.cancelled_occurrence(&every_other_day).is_none());
}

#[test]
fn cancels_series_through_capability_traits() {
    let series: &dyn Recurring = &class_tuesdays();
    let holiday: &dyn Cancellable = &anti(20200421, 19.0, 1.25);
    let cancelled: Vec<u32> = series
        .occurrences()
        .unwrap()
        .iter()
        .filter(|occurrence| holiday.cancels(occurrence).unwrap())
        .map(Task::date_int)
        .collect();
    assert_eq!(cancelled, vec![20200421]);
}
