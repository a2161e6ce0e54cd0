use tracing::{info, warn};

use crate::error::LimiterError;

use super::Limiter;

impl Limiter {
    /// Change the ceiling.
    ///
    /// Raising it by `d` starts up to `d` queued tasks right away, never
    /// pushing the live count past the new ceiling. Lowering it leaves
    /// running tasks alone; new tasks start only once the live count has
    /// dropped below the new ceiling.
    pub fn set_concurrency(&self, concurrency: usize) -> Result<(), LimiterError> {
        if concurrency == 0 {
            return Err(LimiterError::InvalidConcurrency(concurrency));
        }

        let claimed = {
            let mut state = self.lock();
            let previous = state.concurrency;
            state.concurrency = concurrency;

            let mut promoted = 0;
            if concurrency > previous && !state.pending.is_empty() {
                match self.resolve_runtime(&mut state) {
                    Some(runtime) => {
                        promoted =
                            self.take_promotable(&mut state, &runtime, concurrency - previous);
                    }
                    None => warn!("no tokio runtime available, queued tasks wait for a completion"),
                }
            }

            info!(from = previous, to = concurrency, promoted, "concurrency changed");
            Self::claim_launcher(&mut state)
        };

        if claimed {
            self.run_starts();
        }
        Ok(())
    }

    /// Discard every queued task.
    ///
    /// Discarded tasks never run and their futures never resolve. Running
    /// tasks are not affected.
    pub fn clear_queue(&self) {
        let discarded = {
            let mut state = self.lock();
            let discarded = std::mem::take(&mut state.pending);
            state.stats.discarded += discarded.count() as u64;
            discarded
        };

        info!(discarded = discarded.count(), "queue cleared");
        // Dropped outside the lock: task closures may own values whose
        // destructors call back into the limiter.
        drop(discarded);
    }
}
