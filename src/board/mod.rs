//! # Shared Task Board
//!
//! The reader/writer-locked collection of [`TaskRecord`]s. One
//! `parking_lot::RwLock` guards every access:
//!
//! - lookups (`is_task_done`, `task_state`, `snapshot`) take the shared lock
//! - insertion and execution take the exclusive lock
//! - `increase_priority` takes an upgradable read to search and upgrades to the
//!   write lock only when the task exists
//!
//! Records are kept in insertion order; selection order is decided by priority
//! at execution time, with insertion order breaking ties. Records are never
//! removed while the board lives.
//!
//! The `try_*` variants wait a bounded time for the lock and report
//! [`LockOutcome::Skipped`] instead of blocking past it.

mod sink;

pub use sink::TaskSink;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{TaskLookup, TaskRecord};
use crate::observer::{BoardObserver, NoopObserver};
use crate::shutdown::{ShutdownSignal, Termination};
use crate::stats::{BoardCounters, BoardStats};

/// What `add_task` did with the submitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOutcome {
    Inserted,
    Duplicate,
}

/// Result of a bounded-wait operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockOutcome<T> {
    /// The lock was acquired and the operation ran.
    Acquired(T),
    /// The wait expired; the operation was skipped this cycle.
    Skipped,
}

impl<T> LockOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, LockOutcome::Skipped)
    }

    pub fn acquired(self) -> Option<T> {
        match self {
            LockOutcome::Acquired(value) => Some(value),
            LockOutcome::Skipped => None,
        }
    }
}

/// Outcome of one executor tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickReport {
    pub executed: Option<TaskRecord>,
    pub termination: Option<Termination>,
}

/// Serializable copy of the board taken under the read lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub max_tasks: usize,
    pub total: usize,
    pub pending: usize,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Default)]
struct BoardInner {
    tasks: Vec<TaskRecord>,
    index: HashMap<String, usize>,
    pending: usize,
}

impl BoardInner {
    fn insert(&mut self, record: TaskRecord) -> AddOutcome {
        if self.index.contains_key(&record.name) {
            return AddOutcome::Duplicate;
        }
        self.index.insert(record.name.clone(), self.tasks.len());
        if record.is_pending() {
            self.pending += 1;
        }
        self.tasks.push(record);
        AddOutcome::Inserted
    }

    fn lookup(&self, name: &str) -> TaskLookup {
        self.index
            .get(name)
            .map(|&position| TaskLookup::from(self.tasks[position].status))
            .unwrap_or(TaskLookup::NotFound)
    }

    /// Lowest priority number wins; the earliest inserted wins a tie.
    fn next_pending(&self) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.is_pending())
            .min_by_key(|(position, task)| (task.priority, *position))
            .map(|(position, _)| position)
    }

    fn execute_next(&mut self) -> Option<TaskRecord> {
        let position = self.next_pending()?;
        let task = &mut self.tasks[position];
        task.complete();
        self.pending -= 1;
        Some(task.clone())
    }

    fn escalate(&mut self, position: usize) -> (i64, i64) {
        let task = &mut self.tasks[position];
        let old = task.priority;
        task.priority = old.saturating_add(1);
        (old, task.priority)
    }

    fn termination(&self, max_tasks: usize) -> Option<Termination> {
        if self.pending > max_tasks {
            return Some(Termination::Overloaded {
                unfinished: self.pending,
            });
        }
        if !self.tasks.is_empty() && self.pending == 0 {
            return Some(Termination::Drained {
                executed: self.tasks.len(),
            });
        }
        None
    }
}

pub struct TaskBoard {
    inner: RwLock<BoardInner>,
    max_tasks: usize,
    observer: Arc<dyn BoardObserver>,
    counters: BoardCounters,
}

impl fmt::Debug for TaskBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskBoard")
            .field("max_tasks", &self.max_tasks)
            .field("observer", &self.observer)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl TaskBoard {
    /// Create an empty board that reports overload once more than
    /// `max_tasks` tasks are pending.
    pub fn new(max_tasks: usize) -> Self {
        Self::with_observer(max_tasks, Arc::new(NoopObserver))
    }

    pub fn with_observer(max_tasks: usize, observer: Arc<dyn BoardObserver>) -> Self {
        Self {
            inner: RwLock::new(BoardInner::default()),
            max_tasks,
            observer,
            counters: BoardCounters::default(),
        }
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn observer(&self) -> &Arc<dyn BoardObserver> {
        &self.observer
    }

    /// Insert a pending task unless one with the same name exists.
    ///
    /// Fails only on an invalid (empty) name.
    pub fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome> {
        let record = TaskRecord::new(name, priority)?;
        let outcome = self.inner.write().insert(record.clone());
        self.report_add(outcome, &record);
        Ok(outcome)
    }

    /// Like [`add_task`](Self::add_task), giving up after `timeout`.
    pub fn try_add_task(
        &self,
        name: &str,
        priority: i64,
        timeout: Duration,
    ) -> Result<LockOutcome<AddOutcome>> {
        let record = TaskRecord::new(name, priority)?;
        let Some(mut inner) = self.inner.try_write_for(timeout) else {
            self.report_skip("add_task", name);
            return Ok(LockOutcome::Skipped);
        };
        let outcome = inner.insert(record.clone());
        drop(inner);

        self.report_add(outcome, &record);
        Ok(LockOutcome::Acquired(outcome))
    }

    /// Bump a task's priority number by one. Returns the new priority, or
    /// `None` when no task has that name.
    pub fn increase_priority(&self, name: &str) -> Option<i64> {
        let guard = self.inner.upgradable_read();
        let position = *guard.index.get(name)?;
        let mut inner = RwLockUpgradableReadGuard::upgrade(guard);
        let (old, new) = inner.escalate(position);
        drop(inner);

        self.report_escalation(name, old, new);
        Some(new)
    }

    /// Like [`increase_priority`](Self::increase_priority), giving up if
    /// either the search or the upgrade waits longer than `timeout`.
    pub fn try_increase_priority(&self, name: &str, timeout: Duration) -> LockOutcome<Option<i64>> {
        let Some(guard) = self.inner.try_upgradable_read_for(timeout) else {
            self.report_skip("increase_priority", name);
            return LockOutcome::Skipped;
        };
        let Some(&position) = guard.index.get(name) else {
            return LockOutcome::Acquired(None);
        };
        let mut inner = match RwLockUpgradableReadGuard::try_upgrade_for(guard, timeout) {
            Ok(inner) => inner,
            Err(guard) => {
                drop(guard);
                self.report_skip("increase_priority", name);
                return LockOutcome::Skipped;
            }
        };
        let (old, new) = inner.escalate(position);
        drop(inner);

        self.report_escalation(name, old, new);
        LockOutcome::Acquired(Some(new))
    }

    /// `true` only for a known, completed task. Unknown names read as `false`;
    /// use [`task_state`](Self::task_state) to tell them apart.
    pub fn is_task_done(&self, name: &str) -> bool {
        self.task_state(name).is_done()
    }

    pub fn try_is_task_done(&self, name: &str, timeout: Duration) -> LockOutcome<bool> {
        match self.inner.try_read_for(timeout) {
            Some(inner) => LockOutcome::Acquired(inner.lookup(name).is_done()),
            None => {
                self.report_skip("is_task_done", name);
                LockOutcome::Skipped
            }
        }
    }

    pub fn task_state(&self, name: &str) -> TaskLookup {
        self.inner.read().lookup(name)
    }

    pub fn get(&self, name: &str) -> Option<TaskRecord> {
        let inner = self.inner.read();
        inner
            .index
            .get(name)
            .map(|&position| inner.tasks[position].clone())
    }

    /// Complete the most urgent pending task and return a copy of it.
    pub fn execute_one_task(&self) -> Option<TaskRecord> {
        let executed = self.inner.write().execute_next();
        if let Some(task) = &executed {
            self.report_execution(task);
        }
        executed
    }

    /// Evaluate the terminal conditions without executing anything.
    pub fn check_termination(&self) -> Option<Termination> {
        self.inner.read().termination(self.max_tasks)
    }

    /// One executor step: execute the most urgent pending task, then check
    /// the terminal conditions, all inside a single write-lock section.
    pub fn tick(&self) -> TickReport {
        self.tick_signalling(None).0
    }

    /// [`tick`](Self::tick), also triggering `shutdown` on a terminal
    /// condition before the write lock is released. The flag is `true` only
    /// for the tick that actually set the signal.
    pub fn tick_and_signal(&self, shutdown: &ShutdownSignal) -> (TickReport, bool) {
        self.tick_signalling(Some(shutdown))
    }

    fn tick_signalling(&self, shutdown: Option<&ShutdownSignal>) -> (TickReport, bool) {
        let mut inner = self.inner.write();
        let executed = inner.execute_next();
        let termination = inner.termination(self.max_tasks);
        let signalled = match (termination, shutdown) {
            (Some(termination), Some(shutdown)) => shutdown.trigger(termination),
            _ => false,
        };
        drop(inner);

        if let Some(task) = &executed {
            self.report_execution(task);
        }
        (
            TickReport {
                executed,
                termination,
            },
            signalled,
        )
    }

    pub fn len(&self) -> usize {
        self.inner.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.inner.read().pending
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let inner = self.inner.read();
        BoardSnapshot {
            max_tasks: self.max_tasks,
            total: inner.tasks.len(),
            pending: inner.pending,
            tasks: inner.tasks.clone(),
        }
    }

    pub fn stats(&self) -> BoardStats {
        self.counters.snapshot()
    }

    fn report_add(&self, outcome: AddOutcome, record: &TaskRecord) {
        match outcome {
            AddOutcome::Inserted => {
                self.counters.record_added();
                self.observer.task_added(record);
            }
            AddOutcome::Duplicate => {
                self.counters.record_duplicate();
                self.observer.duplicate_skipped(&record.name);
            }
        }
    }

    fn report_escalation(&self, name: &str, old: i64, new: i64) {
        self.counters.record_escalation();
        self.observer.priority_changed(name, old, new);
    }

    fn report_execution(&self, task: &TaskRecord) {
        self.counters.record_executed();
        self.observer.task_executed(task);
    }

    fn report_skip(&self, operation: &str, name: &str) {
        self.counters.record_lock_skip();
        self.observer.lock_skipped(operation, name);
    }
}
