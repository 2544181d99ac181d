//! Shared helpers for the integration tests.

#![allow(dead_code)] // Each test binary uses a different subset

pub mod strategies;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskboard::config::{BoardConfig, ExecutorConfig, ProducerConfig, SimulationConfig};
use taskboard::{
    AddOutcome, BoardError, BoardObserver, Result, TaskBoard, TaskLookup, TaskRecord, TaskSink,
    Termination,
};

/// Every event the board and roles reported, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Added(String),
    Duplicate(String),
    Executed(String),
    PriorityChanged { name: String, old: i64, new: i64 },
    LockSkipped(String),
    Terminated(Termination),
    CallbackFailed { role: String, operation: String },
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn terminations(&self) -> Vec<Termination> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Terminated(termination) => Some(*termination),
                _ => None,
            })
            .collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Executed(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, Event::CallbackFailed { .. }))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl BoardObserver for RecordingObserver {
    fn task_added(&self, task: &TaskRecord) {
        self.push(Event::Added(task.name.clone()));
    }

    fn duplicate_skipped(&self, name: &str) {
        self.push(Event::Duplicate(name.to_string()));
    }

    fn task_executed(&self, task: &TaskRecord) {
        self.push(Event::Executed(task.name.clone()));
    }

    fn priority_changed(&self, name: &str, old: i64, new: i64) {
        self.push(Event::PriorityChanged {
            name: name.to_string(),
            old,
            new,
        });
    }

    fn lock_skipped(&self, _operation: &str, name: &str) {
        self.push(Event::LockSkipped(name.to_string()));
    }

    fn terminated(&self, termination: &Termination) {
        self.push(Event::Terminated(*termination));
    }

    fn callback_failed(&self, error: &BoardError) {
        if let BoardError::CallbackFailed {
            role, operation, ..
        } = error
        {
            self.push(Event::CallbackFailed {
                role: role.clone(),
                operation: operation.clone(),
            });
        }
    }
}

/// A sink that delegates to a real board but fails every `fail_every`-th
/// submission, alternating between returning an error and panicking.
#[derive(Debug)]
pub struct FlakySink {
    board: TaskBoard,
    fail_every: usize,
    calls: AtomicUsize,
}

impl FlakySink {
    pub fn new(board: TaskBoard, fail_every: usize) -> Self {
        Self {
            board,
            fail_every,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }
}

impl TaskSink for FlakySink {
    fn add_task(&self, name: &str, priority: i64) -> Result<AddOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            if (call / self.fail_every) % 2 == 1 {
                return Err(BoardError::invalid_state("injected failure"));
            }
            panic!("injected panic on call {call}");
        }
        self.board.add_task(name, priority)
    }

    fn increase_priority(&self, name: &str) -> Option<i64> {
        self.board.increase_priority(name)
    }

    fn is_task_done(&self, name: &str) -> bool {
        self.board.is_task_done(name)
    }

    fn task_state(&self, name: &str) -> TaskLookup {
        self.board.task_state(name)
    }
}

pub fn board_with(tasks: &[(&str, i64)], max_tasks: usize) -> TaskBoard {
    let board = TaskBoard::new(max_tasks);
    for (name, priority) in tasks {
        board.add_task(name, *priority).unwrap();
    }
    board
}

pub fn producer_config(submit_interval_ms: u64) -> ProducerConfig {
    ProducerConfig {
        submit_interval_ms,
        poll_interval_ms: submit_interval_ms * 2,
        escalate_interval_ms: submit_interval_ms + submit_interval_ms / 2,
        max_priority: 5,
        lock_timeout_ms: None,
    }
}

pub fn executor_config(max_tasks: usize, tick_interval_ms: u64) -> ExecutorConfig {
    ExecutorConfig {
        max_tasks,
        tick_interval_ms,
    }
}

pub fn simulation_config(
    executor: ExecutorConfig,
    submit_interval_ms: u64,
    dependents: usize,
    supervisors: usize,
) -> BoardConfig {
    BoardConfig {
        executor,
        dependent: producer_config(submit_interval_ms),
        supervisor: producer_config(submit_interval_ms),
        simulation: SimulationConfig {
            dependents,
            supervisors,
            deadline_ms: Some(60_000),
        },
        ..BoardConfig::default()
    }
}
