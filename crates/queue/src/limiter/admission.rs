use std::future::Future;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::LimiterError;
use crate::task::{TaskFuture, TaskRecord};

use super::Limiter;

impl Limiter {
    /// Submit a task, running it now if a slot is free or queuing it otherwise.
    ///
    /// `task` is called at most once, when the task starts. The returned
    /// future resolves to whatever the task's future produces.
    ///
    /// Fails immediately, before anything is queued, if the ceiling is 0 or
    /// no tokio runtime is available.
    pub fn submit<F, Fut, T>(&self, task: F) -> Result<TaskFuture<T>, LimiterError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with(move |()| task(), ())
    }

    /// Like [`submit`](Self::submit), binding `args` now and passing them to
    /// `task` when it starts. Use a tuple for several arguments.
    pub fn submit_with<F, A, Fut, T>(
        &self,
        task: F,
        args: A,
    ) -> Result<TaskFuture<T>, LimiterError>
    where
        F: FnOnce(A) -> Fut + Send + 'static,
        A: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (claimed, future) = {
            let mut state = self.lock();
            if state.concurrency == 0 {
                return Err(LimiterError::InvalidConcurrency(state.concurrency));
            }
            let runtime = self
                .resolve_runtime(&mut state)
                .ok_or(LimiterError::NoRuntime)?;

            let id = state.next_task_id();
            let (tx, rx) = oneshot::channel();
            let record = TaskRecord::new(id, task, args, tx);
            state.stats.submitted += 1;

            if state.pending.is_empty() && state.active.len() < state.concurrency {
                state.active.insert(id);
                let active = state.active.len();
                state.stats.record_start(active);
                debug!(task_id = %id, active, "task admitted");
                Self::admit(&mut state, record, &runtime);
            } else {
                state.pending.push(record);
                state.stats.queued += 1;
                debug!(
                    task_id = %id,
                    active = state.active.len(),
                    pending = state.pending.count(),
                    "task queued"
                );
                // Normally a no-op: only fills slots a missed promotion left free.
                self.take_promotable(&mut state, &runtime, usize::MAX);
            }

            (Self::claim_launcher(&mut state), TaskFuture::new(id, rx))
        };

        if claimed {
            self.run_starts();
        }
        Ok(future)
    }
}
