//! Lock-free operation counters kept alongside the board.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct BoardCounters {
    added: AtomicU64,
    duplicates: AtomicU64,
    executed: AtomicU64,
    escalations: AtomicU64,
    lock_skips: AtomicU64,
}

impl BoardCounters {
    pub(crate) fn record_added(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_escalation(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lock_skip(&self) {
        self.lock_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BoardStats {
        BoardStats {
            added: self.added.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            lock_skips: self.lock_skips.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the board's operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    pub added: u64,
    pub duplicates: u64,
    pub executed: u64,
    pub escalations: u64,
    pub lock_skips: u64,
}
