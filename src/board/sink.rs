use std::time::Duration;

use super::{AddOutcome, LockOutcome, TaskBoard};
use crate::error::Result;
use crate::models::TaskLookup;

/// The board façade as seen by producer roles.
///
/// Roles never hold the collection or its lock; everything goes through this
/// trait, which is implemented by [`TaskBoard`] and by the executor that owns
/// one. Test doubles implement it to inject faults into role callbacks.
pub trait TaskSink: Send + Sync {
    fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome>;

    fn increase_priority(&self, name: &str) -> Option<i64>;

    /// Two-valued completion check: unknown names read as `false`. Roles poll
    /// with [`task_state`](Self::task_state) to tell NotFound apart; this stays
    /// for callers that only care whether a task finished.
    fn is_task_done(&self, name: &str) -> bool;

    fn task_state(&self, name: &str) -> TaskLookup;

    /// Bounded-wait insertion. Sinks without a timed lock apply the add directly.
    fn try_add_task(
        &self,
        name: &str,
        priority: i64,
        _timeout: Duration,
    ) -> Result<LockOutcome<AddOutcome>> {
        self.add_task(name, priority).map(LockOutcome::Acquired)
    }
}

impl TaskSink for TaskBoard {
    fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome> {
        TaskBoard::add_task(self, name, priority)
    }

    fn increase_priority(&self, name: &str) -> Option<i64> {
        TaskBoard::increase_priority(self, name)
    }

    fn is_task_done(&self, name: &str) -> bool {
        TaskBoard::is_task_done(self, name)
    }

    fn task_state(&self, name: &str) -> TaskLookup {
        TaskBoard::task_state(self, name)
    }

    fn try_add_task(
        &self,
        name: &str,
        priority: i64,
        timeout: Duration,
    ) -> Result<LockOutcome<AddOutcome>> {
        TaskBoard::try_add_task(self, name, priority, timeout)
    }
}
