//! # Task Record
//!
//! The unit of work tracked by the board. Identity is the task name; priority
//! and status are mutable, but only through the board's write-locked paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DONE_PRIORITY;
use crate::error::{BoardError, Result};

/// Completion status of a task. Transitions only `Pending -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Done,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// Result of looking a task up by name.
///
/// `TaskBoard::is_task_done` collapses `NotFound` and `Pending` into `false`;
/// this type keeps them apart for callers that need to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLookup {
    NotFound,
    Pending,
    Done,
}

impl TaskLookup {
    pub fn is_done(self) -> bool {
        matches!(self, TaskLookup::Done)
    }
}

impl From<TaskStatus> for TaskLookup {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => TaskLookup::Pending,
            TaskStatus::Done => TaskLookup::Done,
        }
    }
}

/// A named, prioritized unit of work. Lower priority numbers are more urgent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub priority: i64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a pending task. An empty name is a programmer error.
    pub fn new(name: impl Into<String>, priority: i64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BoardError::invalid_argument("task name must not be empty"));
        }

        Ok(Self {
            name,
            priority,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Mark the task done and park its priority at the sentinel.
    ///
    /// Idempotent: completing a finished task keeps its original completion time.
    pub(crate) fn complete(&mut self) {
        if self.is_done() {
            return;
        }
        self.status = TaskStatus::Done;
        self.priority = DONE_PRIORITY;
        self.completed_at = Some(Utc::now());
    }
}
