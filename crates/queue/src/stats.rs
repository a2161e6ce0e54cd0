use std::fmt;

use serde::{Deserialize, Serialize};

/// Point-in-time view of a limiter's counters and queue state.
///
/// Every field is read under the same lock, so the snapshot is internally
/// consistent (e.g. `started <= submitted`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterStats {
    /// Tasks accepted by `submit` (rejected submissions are not counted).
    pub submitted: u64,
    /// Tasks that had to wait in the queue at submission time.
    pub queued: u64,
    /// Tasks that were launched, immediately or by promotion.
    pub started: u64,
    /// Tasks whose future produced a value.
    pub completed: u64,
    /// Tasks that panicked.
    pub panicked: u64,
    /// Queued tasks dropped by `clear_queue` without ever running.
    pub discarded: u64,
    /// Highest number of simultaneously running tasks seen so far.
    pub peak_active: usize,
    /// Tasks running right now.
    pub active: usize,
    /// Tasks waiting right now.
    pub pending: usize,
    /// Current concurrency ceiling.
    pub concurrency: usize,
}

impl LimiterStats {
    /// Tasks that reached a terminal state (value or panic).
    pub fn settled(&self) -> u64 {
        self.completed + self.panicked
    }

    /// Record a launch and keep the high-water mark current.
    pub(crate) fn record_start(&mut self, active_now: usize) {
        self.started += 1;
        self.peak_active = self.peak_active.max(active_now);
    }
}

impl fmt::Display for LimiterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LimiterStats {{ active: {}/{}, pending: {}, submitted: {}, settled: {}, discarded: {} }}",
            self.active,
            self.concurrency,
            self.pending,
            self.submitted,
            self.settled(),
            self.discarded
        )
    }
}
