//! # Board Observer
//!
//! Injectable collaborator notified on every board state transition. The board
//! and the roles never print; they report here, and the default
//! [`TracingObserver`] turns each event into a structured `tracing` record.
//!
//! Observers are invoked after the board lock is released, so an observer may
//! safely call back into the board.

use std::fmt::Debug;
use tracing::{debug, error, info, warn};

use crate::error::BoardError;
use crate::models::TaskRecord;
use crate::shutdown::Termination;

pub trait BoardObserver: Send + Sync + Debug {
    fn task_added(&self, _task: &TaskRecord) {}

    fn duplicate_skipped(&self, _name: &str) {}

    fn task_executed(&self, _task: &TaskRecord) {}

    fn priority_changed(&self, _name: &str, _old: i64, _new: i64) {}

    /// A bounded-wait operation gave up on the lock and was skipped.
    fn lock_skipped(&self, _operation: &str, _name: &str) {}

    fn terminated(&self, _termination: &Termination) {}

    /// A periodic callback returned an error or panicked. The role keeps
    /// running. `error` is always [`BoardError::CallbackFailed`].
    fn callback_failed(&self, _error: &BoardError) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BoardObserver for NoopObserver {}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BoardObserver for TracingObserver {
    fn task_added(&self, task: &TaskRecord) {
        info!(
            task_name = %task.name,
            priority = task.priority,
            "📋 TASK_ADDED"
        );
    }

    fn duplicate_skipped(&self, name: &str) {
        debug!(task_name = %name, "Duplicate task name ignored");
    }

    fn task_executed(&self, task: &TaskRecord) {
        info!(
            task_name = %task.name,
            completed_at = ?task.completed_at,
            "✅ TASK_EXECUTED"
        );
    }

    fn priority_changed(&self, name: &str, old: i64, new: i64) {
        info!(
            task_name = %name,
            old_priority = old,
            new_priority = new,
            "⬆️ PRIORITY_CHANGED"
        );
    }

    fn lock_skipped(&self, operation: &str, name: &str) {
        debug!(
            operation = %operation,
            task_name = %name,
            "Lock wait expired, operation skipped this cycle"
        );
    }

    fn terminated(&self, termination: &Termination) {
        match termination {
            Termination::Drained { executed } => {
                info!(executed = executed, "🏁 BOARD_DRAINED: all tasks complete");
            }
            Termination::Overloaded { unfinished } => {
                warn!(
                    unfinished = unfinished,
                    "🚨 BOARD_OVERLOADED: too many pending tasks"
                );
            }
        }
    }

    fn callback_failed(&self, error: &BoardError) {
        if let BoardError::CallbackFailed {
            role,
            operation,
            message,
        } = error
        {
            error!(
                role = %role,
                operation = %operation,
                error = %message,
                "❌ Periodic callback failed"
            );
        } else {
            error!(error = %error, "❌ Periodic callback failed");
        }
    }
}
