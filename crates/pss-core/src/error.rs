//! Error types for schedule operations.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`ScheduleError`], for callers that branch on
/// the failure category rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NameConflict,
    SchedulingConflict,
    CancellationMismatch,
    NotFound,
    File,
    DateRange,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A field failed validation (bad date, time, duration, frequency, name or type).
    #[error("invalid task: {0}")]
    Validation(String),

    /// The name is already used by a task in one of the three collections.
    #[error("task name already exists: {0}")]
    NameConflict(String),

    /// The candidate overlaps an existing, uncancelled commitment.
    #[error("scheduling conflict: {0}")]
    SchedulingConflict(String),

    /// An anti-task matches no recurring occurrence, or removing it would reopen a conflict.
    #[error("cancellation mismatch: {0}")]
    CancellationMismatch(String),

    #[error("task not found: {0}")]
    NotFound(String),

    /// Malformed schedule file content (shape, keys, value types).
    #[error("bad schedule file: {0}")]
    File(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Calendar arithmetic left chrono's representable range.
    #[error("date out of range: {0}")]
    DateRange(String),
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::Validation(_) => ErrorKind::Validation,
            ScheduleError::NameConflict(_) => ErrorKind::NameConflict,
            ScheduleError::SchedulingConflict(_) => ErrorKind::SchedulingConflict,
            ScheduleError::CancellationMismatch(_) => ErrorKind::CancellationMismatch,
            ScheduleError::NotFound(_) => ErrorKind::NotFound,
            ScheduleError::File(_) | ScheduleError::Io { .. } | ScheduleError::Json(_) => {
                ErrorKind::File
            }
            ScheduleError::DateRange(_) => ErrorKind::DateRange,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
