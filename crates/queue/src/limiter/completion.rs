use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::task::{Outcome, TaskId, TaskRecord};

use super::core::State;
use super::Limiter;

/// Holds a task's slot in the live set until the task settles or is dropped.
struct SlotGuard {
    limiter: Limiter,
    id: TaskId,
    outcome: Option<Outcome>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.limiter.finish(self.id, self.outcome.take());
    }
}

impl Limiter {
    /// Queue an admitted task for launch. Its id must already be in the
    /// live set.
    pub(super) fn admit(state: &mut State, record: TaskRecord, runtime: &Handle) {
        state.starting.push((record, runtime.clone()));
    }

    /// Claim the launcher role if there is anything to start and nobody else
    /// holds it. The caller must call [`run_starts`](Self::run_starts) after
    /// releasing the lock when this returns `true`.
    pub(super) fn claim_launcher(state: &mut State) -> bool {
        if state.launching || state.starting.is_empty() {
            return false;
        }
        state.launching = true;
        true
    }

    /// Start admitted tasks one at a time, in admission order, until none
    /// are left.
    ///
    /// Closures run without the lock held, so a task may submit to its own
    /// limiter; such a submission is started by this loop once the current
    /// closure returns.
    pub(super) fn run_starts(&self) {
        loop {
            let next = {
                let mut state = self.lock();
                let next = state.starting.shift();
                if next.is_none() {
                    state.launching = false;
                }
                next
            };
            let Some((record, runtime)) = next else {
                return;
            };
            self.launch(record, &runtime);
        }
    }

    /// Invoke the task's closure and spawn the future it returns.
    fn launch(&self, record: TaskRecord, runtime: &Handle) {
        let guard = SlotGuard {
            limiter: self.clone(),
            id: record.id,
            outcome: None,
        };
        let fut = record.start();
        runtime.spawn(async move {
            let mut guard = guard;
            let settlement = fut.await;
            guard.outcome = Some(settlement.outcome);
            // The slot is released before the caller sees the result.
            drop(guard);
            settlement.deliver();
        });
    }

    /// Move up to `limit` records from the head of the queue into the live
    /// set while it is below the ceiling. Returns how many were promoted.
    pub(super) fn take_promotable(
        &self,
        state: &mut State,
        runtime: &Handle,
        limit: usize,
    ) -> usize {
        let mut promoted = 0;
        while promoted < limit && state.active.len() < state.concurrency {
            let Some(record) = state.pending.shift() else {
                break;
            };
            state.active.insert(record.id);
            let active = state.active.len();
            state.stats.record_start(active);
            debug!(task_id = %record.id, active, pending = state.pending.count(), "task promoted");
            Self::admit(state, record, runtime);
            promoted += 1;
        }
        promoted
    }

    /// Release a settled task's slot and promote at most one queued task.
    fn finish(&self, id: TaskId, outcome: Option<Outcome>) {
        let claimed = {
            let mut state = self.lock();
            state.active.remove(&id);

            match outcome {
                Some(Outcome::Completed) => state.stats.completed += 1,
                Some(Outcome::Panicked) => {
                    state.stats.panicked += 1;
                    warn!(task_id = %id, "task panicked");
                }
                None => {
                    // The runtime dropped the task mid-flight, so it is
                    // shutting down: start nothing else on it.
                    warn!(task_id = %id, "task dropped before settling");
                    state.last_runtime = None;
                    return;
                }
            }
            debug!(
                task_id = %id,
                active = state.active.len(),
                pending = state.pending.count(),
                "task settled"
            );

            if !state.pending.is_empty() {
                if let Some(runtime) = self.resolve_runtime(&mut state) {
                    self.take_promotable(&mut state, &runtime, 1);
                }
            }
            Self::claim_launcher(&mut state)
        };

        if claimed {
            self.run_starts();
        }
    }
}
