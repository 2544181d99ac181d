#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Task Board
//!
//! A concurrent priority task board: one shared, reader/writer-locked
//! collection of tasks, an executor that owns it and works through it on a
//! timer, and producer roles that feed and reprioritize it from their own
//! timers until a cooperative shutdown.
//!
//! ## Architecture
//!
//! - The [`board::TaskBoard`] is the only shared mutable resource. Lookups take
//!   the read lock, insertion and execution the write lock, and priority
//!   escalation searches under an upgradable read before upgrading.
//! - The [`executor::Executor`] owns the board, exposes its façade and ticks
//!   periodically: execute the most urgent pending task, then check whether
//!   the board drained or overloaded.
//! - [`roles::PeriodicProducer`]s (dependents and supervisors) submit, poll and
//!   escalate through the [`board::TaskSink`] trait.
//! - A [`shutdown::ShutdownSignal`] is injected into every role; the first
//!   terminal condition sets it and every periodic loop winds down.
//!
//! ## Module Organization
//!
//! - [`models`] - Task records and lookup results
//! - [`board`] - The locked collection and its façade trait
//! - [`executor`] - Board owner, execution tick and lifecycle
//! - [`roles`] - Dependent and supervisor producers
//! - [`shutdown`] - One-shot shutdown signal and termination reasons
//! - [`observer`] - Injectable event sink for state transitions
//! - [`simulation`] - Harness running all roles together
//! - [`config`] - Layered configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard::config::ExecutorConfig;
//! use taskboard::observer::TracingObserver;
//! use taskboard::{Executor, ShutdownSignal};
//!
//! # async fn example() -> taskboard::Result<()> {
//! let shutdown = ShutdownSignal::new();
//! let executor = Executor::spawn(
//!     &ExecutorConfig::default(),
//!     shutdown.clone(),
//!     Arc::new(TracingObserver),
//! )?;
//!
//! executor.add_task("compile", 2)?;
//! executor.add_task("lint", 1)?;
//!
//! shutdown.wait().await;
//! assert!(executor.is_task_done("compile"));
//! executor.dispose();
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod observer;
mod periodic;
pub mod roles;
pub mod shutdown;
pub mod simulation;
pub mod stats;

pub use board::{AddOutcome, BoardSnapshot, LockOutcome, TaskBoard, TaskSink, TickReport};
pub use config::{BoardConfig, ConfigManager};
pub use error::{BoardError, Result};
pub use executor::{Executor, ExecutorState};
pub use models::{TaskLookup, TaskRecord, TaskStatus};
pub use observer::{BoardObserver, NoopObserver, TracingObserver};
pub use roles::{PeriodicProducer, ProducerHandle, ProducerStrategy};
pub use shutdown::{ShutdownSignal, Termination};
pub use simulation::{Simulation, SimulationReport};
pub use stats::BoardStats;
