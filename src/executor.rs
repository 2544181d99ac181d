//! # Executor
//!
//! The single owner of the [`TaskBoard`]. It exposes the board façade to the
//! other roles and drives a periodic tick that executes the most urgent
//! pending task and checks the terminal conditions.
//!
//! ## Lifecycle
//!
//! ```text
//! Created -> Running -> (Draining | Overloaded) -> Disposed
//! ```
//!
//! Only `Running` executes on a timer. Once a terminal condition is observed
//! the shared [`ShutdownSignal`] is triggered (first observer only), the tick
//! stops rescheduling itself and every other role quiesces. The façade keeps
//! accepting calls in every state.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::board::{AddOutcome, BoardSnapshot, LockOutcome, TaskBoard, TaskSink, TickReport};
use crate::config::ExecutorConfig;
use crate::constants::operations;
use crate::error::{BoardError, Result};
use crate::models::TaskLookup;
use crate::observer::BoardObserver;
use crate::periodic::{run_periodic, PeriodicContext, Step};
use crate::shutdown::{ShutdownSignal, Termination};
use crate::stats::BoardStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    Created = 0,
    Running = 1,
    Draining = 2,
    Overloaded = 3,
    Disposed = 4,
}

impl From<u8> for ExecutorState {
    fn from(value: u8) -> Self {
        match value {
            0 => ExecutorState::Created,
            1 => ExecutorState::Running,
            2 => ExecutorState::Draining,
            3 => ExecutorState::Overloaded,
            _ => ExecutorState::Disposed,
        }
    }
}

impl ExecutorState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutorState::Draining | ExecutorState::Overloaded | ExecutorState::Disposed
        )
    }
}

/// State shared between the executor handle and its tick loop. The loop only
/// holds a `Weak` reference, so dropping the executor ends it.
#[derive(Debug)]
struct ExecutorCore {
    id: Uuid,
    board: TaskBoard,
    shutdown: ShutdownSignal,
    state: AtomicU8,
}

impl ExecutorCore {
    fn state(&self) -> ExecutorState {
        ExecutorState::from(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: ExecutorState, to: ExecutorState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn tick(&self) -> TickReport {
        let (report, signalled) = self.board.tick_and_signal(&self.shutdown);
        if let Some(termination) = report.termination {
            self.terminate(termination, signalled);
        }
        report
    }

    /// Move to the terminal state matching an already-set shutdown reason.
    fn settle(&self) {
        if let Some(reason) = self.shutdown.reason() {
            self.terminate(reason, false);
        }
    }

    /// `signalled` is set only for the tick whose write section triggered
    /// the shutdown; it alone notifies the observer.
    fn terminate(&self, termination: Termination, signalled: bool) {
        if signalled {
            self.board.observer().terminated(&termination);
        }

        let next = if termination.is_overload() {
            ExecutorState::Overloaded
        } else {
            ExecutorState::Draining
        };
        if self.transition(ExecutorState::Running, next)
            || self.transition(ExecutorState::Created, next)
        {
            info!(
                executor_id = %self.id,
                state = ?next,
                termination = %termination,
                "Executor reached terminal condition"
            );
        }
    }
}

#[derive(Debug)]
pub struct Executor {
    core: Arc<ExecutorCore>,
    tick_interval: Duration,
    disposed: AtomicBool,
    tick_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Executor {
    /// Create an executor with an empty board. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: &ExecutorConfig,
        shutdown: ShutdownSignal,
        observer: Arc<dyn BoardObserver>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(
            executor_id = %id,
            max_tasks = config.max_tasks,
            tick_interval_ms = config.tick_interval_ms,
            "Creating executor"
        );

        Self {
            core: Arc::new(ExecutorCore {
                id,
                board: TaskBoard::with_observer(config.max_tasks, observer),
                shutdown,
                state: AtomicU8::new(ExecutorState::Created as u8),
            }),
            tick_interval: config.tick_interval(),
            disposed: AtomicBool::new(false),
            tick_handle: Mutex::new(None),
        }
    }

    /// Create and immediately start an executor on the current tokio runtime.
    pub fn spawn(
        config: &ExecutorConfig,
        shutdown: ShutdownSignal,
        observer: Arc<dyn BoardObserver>,
    ) -> Result<Self> {
        let executor = Self::new(config, shutdown, observer);
        executor.start()?;
        Ok(executor)
    }

    /// Start the periodic execution tick on the current tokio runtime.
    #[instrument(skip(self), fields(executor_id = %self.core.id))]
    pub fn start(&self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| {
            BoardError::invalid_state(format!("executor requires a tokio runtime: {e}"))
        })?;

        if !self
            .core
            .transition(ExecutorState::Created, ExecutorState::Running)
        {
            return Err(BoardError::invalid_state(format!(
                "executor cannot start from state {:?}",
                self.core.state()
            )));
        }

        let ctx = PeriodicContext {
            role: format!("executor-{}", self.core.id),
            operation: operations::EXECUTE,
            period: self.tick_interval,
            shutdown: self.core.shutdown.clone(),
            observer: Arc::clone(self.core.board.observer()),
        };
        let weak: Weak<ExecutorCore> = Arc::downgrade(&self.core);
        let settle = Weak::clone(&weak);
        let handle = runtime.spawn(async move {
            run_periodic(ctx, move || {
                let Some(core) = weak.upgrade() else {
                    return Ok(Step::Stop);
                };
                if core.state() != ExecutorState::Running {
                    return Ok(Step::Stop);
                }
                core.tick();
                Ok(Step::Continue)
            })
            .await;

            // The loop may have ended on a signal set by someone else
            if let Some(core) = settle.upgrade() {
                core.settle();
            }
        });
        *self.tick_handle.lock() = Some(handle);

        info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            max_tasks = self.core.board.max_tasks(),
            "Executor started"
        );
        Ok(())
    }

    /// Run one execution step by hand: execute the most urgent pending task
    /// and check the terminal conditions, exactly as the timer does.
    pub fn tick(&self) -> TickReport {
        self.core.tick()
    }

    /// Stop the tick and mark the executor disposed. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.tick_handle.lock().take() {
            handle.abort();
        }
        self.core
            .state
            .store(ExecutorState::Disposed as u8, Ordering::Release);

        info!(executor_id = %self.core.id, "Executor disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Wait until the tick loop has ended (shutdown, disposal or a stop).
    pub async fn join(&self) {
        let handle = self.tick_handle.lock().take();
        if let Some(handle) = handle {
            // A cancelled join just means dispose() aborted the loop
            let _ = handle.await;
        }
    }

    pub fn id(&self) -> Uuid {
        self.core.id
    }

    pub fn state(&self) -> ExecutorState {
        self.core.state()
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.core.shutdown
    }

    pub fn board(&self) -> &TaskBoard {
        &self.core.board
    }

    pub fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome> {
        self.core.board.add_task(name, priority)
    }

    pub fn try_add_task(
        &self,
        name: &str,
        priority: i64,
        timeout: Duration,
    ) -> Result<LockOutcome<AddOutcome>> {
        self.core.board.try_add_task(name, priority, timeout)
    }

    pub fn increase_priority(&self, name: &str) -> Option<i64> {
        self.core.board.increase_priority(name)
    }

    pub fn is_task_done(&self, name: &str) -> bool {
        self.core.board.is_task_done(name)
    }

    pub fn task_state(&self, name: &str) -> TaskLookup {
        self.core.board.task_state(name)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.core.board.snapshot()
    }

    pub fn stats(&self) -> BoardStats {
        self.core.board.stats()
    }
}

impl TaskSink for Executor {
    fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome> {
        Executor::add_task(self, name, priority)
    }

    fn increase_priority(&self, name: &str) -> Option<i64> {
        Executor::increase_priority(self, name)
    }

    fn is_task_done(&self, name: &str) -> bool {
        Executor::is_task_done(self, name)
    }

    fn task_state(&self, name: &str) -> TaskLookup {
        Executor::task_state(self, name)
    }

    fn try_add_task(
        &self,
        name: &str,
        priority: i64,
        timeout: Duration,
    ) -> Result<LockOutcome<AddOutcome>> {
        Executor::try_add_task(self, name, priority, timeout)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.dispose();
    }
}
