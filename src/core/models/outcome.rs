use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::batch::Mode;

/// Why a file failed, kept separate from the user-facing reason so
/// callers can branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FailureKind {
    /// The invocation could not be built (missing or unusable keys).
    Invocation,
    /// The engine process could not be started.
    Spawn,
    /// The engine exited unsuccessfully. `exit_code` is `None` when it was
    /// terminated by a signal.
    Process { exit_code: Option<i32> },
    /// The engine reported success but its output was missing.
    Postcondition,
    /// Reading, writing or renaming files failed.
    Io,
}

/// Final state of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FileStatus {
    Succeeded,
    Failed {
        kind: FailureKind,
        reason: String,
        /// Raw trimmed engine diagnostic, when the engine produced one.
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostic: Option<String>,
    },
    TimedOut {
        reason: String,
    },
}

impl FileStatus {
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        FileStatus::Failed {
            kind,
            reason: reason.into(),
            diagnostic: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileStatus::Succeeded)
    }

    /// The user-facing reason for a failure or timeout.
    pub fn reason(&self) -> Option<&str> {
        match self {
            FileStatus::Succeeded => None,
            FileStatus::Failed { reason, .. } | FileStatus::TimedOut { reason } => {
                Some(reason.as_str())
            }
        }
    }
}

/// Result of processing one input file. Immutable once its turn ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    /// Final output path, only set on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl FileOutcome {
    pub fn file_name(&self) -> String {
        display_name(&self.input)
    }
}

/// Overall state of a finished batch, derived from its counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every file succeeded.
    Succeeded,
    /// Some files succeeded, some did not.
    Partial,
    /// Files were attempted but none succeeded.
    Failed,
    /// Pre-flight validation failed; nothing was attempted.
    Rejected,
}

/// Aggregate result of a batch, consumed by the caller to decide what to
/// show next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub mode: Mode,
    pub success_count: usize,
    pub total_count: usize,
    pub outcomes: Vec<FileOutcome>,
    /// Pre-flight validation message when the batch was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    /// A batch that failed validation before any file was attempted.
    pub fn rejected(mode: Mode, reason: String, started_at: DateTime<Utc>) -> Self {
        Self {
            mode,
            success_count: 0,
            total_count: 0,
            outcomes: Vec::new(),
            rejection: Some(reason),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn from_outcomes(
        mode: Mode,
        outcomes: Vec<FileOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let success_count = outcomes.iter().filter(|o| o.status.is_success()).count();
        Self {
            mode,
            success_count,
            total_count: outcomes.len(),
            outcomes,
            rejection: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn failure_count(&self) -> usize {
        self.total_count - self.success_count
    }

    pub fn status(&self) -> BatchStatus {
        if self.total_count == 0 {
            BatchStatus::Rejected
        } else if self.success_count == self.total_count {
            BatchStatus::Succeeded
        } else if self.success_count == 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        }
    }

    /// Iterates over the outcomes that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }
}

/// File name shown to the user for an input path.
pub fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
