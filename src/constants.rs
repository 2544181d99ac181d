//! # System Constants
//!
//! Sentinels and defaults that define the operational boundaries of the board
//! and of the periodic roles that drive it.

/// Priority written to a task when it completes, so a finished task never
/// competes with pending work on priority.
pub const DONE_PRIORITY: i64 = -1;

/// Default capacity before the board reports overload.
pub const DEFAULT_MAX_TASKS: usize = 10;

/// Default bounded wait for lock acquisition on the `try_*` paths.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;

/// Default environment when `TASKBOARD_ENV` is not set.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TASKBOARD";

/// Default role intervals, in milliseconds. The executor ticks fastest.
pub mod intervals {
    pub const EXECUTOR_TICK_MS: u64 = 250;
    pub const SUBMIT_MS: u64 = 500;
    pub const POLL_MS: u64 = 1_000;
    pub const ESCALATE_MS: u64 = 750;
}

/// Observer operation names, used as structured log fields.
pub mod operations {
    pub const SUBMIT: &str = "submit";
    pub const POLL: &str = "poll";
    pub const ESCALATE: &str = "escalate";
    pub const EXECUTE: &str = "execute";
}
