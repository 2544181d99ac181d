//! # Task Board Configuration
//!
//! Configuration for the executor, the producer roles, the simulation harness
//! and logging. Every section falls back to built-in defaults, so a partial
//! file (or none at all) is valid.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. `config/taskboard.toml`
//! 3. `config/taskboard.{environment}.toml`
//! 4. `TASKBOARD_*` environment variables, `__` separating nested keys
//!    (e.g. `TASKBOARD_EXECUTOR__MAX_TASKS=25`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let max_tasks = manager.config().executor.max_tasks;
//! let tick = manager.config().executor.tick_interval();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::constants::{intervals, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_TASKS};
use crate::error::{BoardError, Result};

pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardConfig {
    pub executor: ExecutorConfig,
    pub dependent: ProducerConfig,
    pub supervisor: ProducerConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

impl BoardConfig {
    pub fn validate(&self) -> Result<()> {
        self.executor.validate()?;
        self.dependent.validate("dependent")?;
        self.supervisor.validate("supervisor")?;

        // A slower executor is legal; it is how overload gets exercised
        if !self.executor_is_fastest() {
            warn!(
                tick_interval_ms = self.executor.tick_interval_ms,
                "Executor tick is not the shortest interval; expect the board to overload"
            );
        }
        Ok(())
    }

    /// Whether the executor tick is shorter than every producer timer that
    /// will actually run (dependents submit and poll; supervisors also escalate).
    pub fn executor_is_fastest(&self) -> bool {
        let tick = self.executor.tick_interval_ms;
        [
            self.dependent.submit_interval_ms,
            self.dependent.poll_interval_ms,
            self.supervisor.submit_interval_ms,
            self.supervisor.poll_interval_ms,
            self.supervisor.escalate_interval_ms,
        ]
        .into_iter()
        .all(|interval| tick < interval)
    }
}

/// Executor settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Pending tasks allowed before the board reports overload
    pub max_tasks: usize,
    /// Period of the execution tick
    pub tick_interval_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_tasks: DEFAULT_MAX_TASKS,
            tick_interval_ms: intervals::EXECUTOR_TICK_MS,
        }
    }
}

impl ExecutorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_tasks == 0 {
            return Err(BoardError::configuration(
                "executor.max_tasks must be greater than 0",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(BoardError::configuration(
                "executor.tick_interval_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Producer role settings, shared by dependents and supervisors.
/// `escalate_interval_ms` only applies to supervisors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub submit_interval_ms: u64,
    /// Must be longer than the submit interval
    pub poll_interval_ms: u64,
    pub escalate_interval_ms: u64,
    /// Submitted priorities are drawn from `1..=max_priority`
    pub max_priority: i64,
    /// When set, submissions wait at most this long for the board lock
    pub lock_timeout_ms: Option<u64>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            submit_interval_ms: intervals::SUBMIT_MS,
            poll_interval_ms: intervals::POLL_MS,
            escalate_interval_ms: intervals::ESCALATE_MS,
            max_priority: 10,
            lock_timeout_ms: None,
        }
    }
}

impl ProducerConfig {
    pub fn submit_interval(&self) -> Duration {
        Duration::from_millis(self.submit_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn escalate_interval(&self) -> Duration {
        Duration::from_millis(self.escalate_interval_ms)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Bounded-wait submissions using the default 250ms lock timeout.
    pub fn with_bounded_wait(mut self) -> Self {
        self.lock_timeout_ms = Some(DEFAULT_LOCK_TIMEOUT_MS);
        self
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.submit_interval_ms == 0 || self.escalate_interval_ms == 0 {
            return Err(BoardError::configuration(format!(
                "{section}: intervals must be greater than 0"
            )));
        }
        if self.poll_interval_ms <= self.submit_interval_ms {
            return Err(BoardError::configuration(format!(
                "{section}.poll_interval_ms ({}) must exceed submit_interval_ms ({})",
                self.poll_interval_ms, self.submit_interval_ms
            )));
        }
        if self.max_priority < 1 {
            return Err(BoardError::configuration(format!(
                "{section}.max_priority must be at least 1"
            )));
        }
        Ok(())
    }
}

/// Simulation harness settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub dependents: usize,
    pub supervisors: usize,
    /// Give up waiting for a terminal condition after this long
    pub deadline_ms: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dependents: 2,
            supervisors: 1,
            deadline_ms: Some(30_000),
        }
    }
}

impl SimulationConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence when set
    pub level: Option<String>,
    pub format: LogFormat,
}
