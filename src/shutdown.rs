//! # Shutdown Coordination
//!
//! A shared, one-shot signal handed to every role at construction. It flips
//! from pending to ended exactly once, carries the [`Termination`] that ended
//! it, and is never reset. Periodic loops race their next tick against
//! [`ShutdownSignal::wait`] and stop rescheduling once it resolves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;

/// Terminal condition observed by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Every task on the board has been executed.
    Drained { executed: usize },
    /// Pending work exceeded the configured capacity.
    Overloaded { unfinished: usize },
}

impl Termination {
    pub fn is_overload(&self) -> bool {
        matches!(self, Termination::Overloaded { .. })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Drained { executed } => {
                write!(f, "drained after executing {executed} tasks")
            }
            Termination::Overloaded { unfinished } => {
                write!(f, "overloaded with {unfinished} unfinished tasks")
            }
        }
    }
}

#[derive(Debug, Default)]
struct ShutdownState {
    ended: AtomicBool,
    reason: OnceLock<Termination>,
    notify: Notify,
}

/// Cloneable handle to a shared shutdown flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.state.ended.load(Ordering::Acquire)
    }

    /// The termination that ended this signal, if any.
    pub fn reason(&self) -> Option<Termination> {
        self.state.reason.get().copied()
    }

    /// Set the flag. Returns `true` only for the caller that actually set it;
    /// later calls leave the recorded reason untouched.
    pub fn trigger(&self, termination: Termination) -> bool {
        if self.state.reason.set(termination).is_err() {
            return false;
        }
        self.state.ended.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
        true
    }

    /// Resolve once the flag is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a trigger between the check and the
            // await still wakes us.
            let notified = self.state.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}
