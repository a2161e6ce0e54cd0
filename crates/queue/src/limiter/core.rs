use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use conqueue_core::LimiterConfig;
use tokio::runtime::Handle;

use crate::stats::LimiterStats;
use crate::task::{TaskId, TaskRecord};
use crate::wait_list::WaitList;

/// Bookkeeping guarded by the limiter's lock.
///
/// Invariant: an id is never in both `active` and `pending`.
pub(super) struct State {
    /// Current ceiling. May be 0 only if the limiter was built with 0.
    pub(super) concurrency: usize,
    /// Ids of tasks that have been admitted and not yet settled.
    pub(super) active: HashSet<TaskId>,
    /// Tasks deferred because the ceiling was reached.
    pub(super) pending: WaitList<TaskRecord>,
    /// Counters only; live fields are filled in by [`Limiter::stats`].
    pub(super) stats: LimiterStats,
    /// Last runtime a task was spawned on, used when promoting from outside it.
    pub(super) last_runtime: Option<Handle>,
    /// Admitted tasks whose closures have not been invoked yet, in the order
    /// they were admitted.
    pub(super) starting: WaitList<(TaskRecord, Handle)>,
    /// Whether some caller is currently draining `starting`.
    pub(super) launching: bool,
    next_id: u64,
}

impl State {
    pub(super) fn next_task_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId::new(self.next_id)
    }
}

pub(super) struct Shared {
    pub(super) state: Mutex<State>,
    /// Runtime pinned at construction, if any.
    pub(super) runtime: Option<Handle>,
}

/// Runs async tasks with at most `concurrency` of them in flight.
///
/// Tasks submitted while the limiter is full wait in a FIFO queue and are
/// started one by one as running tasks settle. Cloning a `Limiter` yields
/// another handle to the same queue and ceiling.
///
/// # Example
/// ```ignore
/// let limiter = Limiter::new(2);
/// let a = limiter.submit(|| fetch("foo"))?;
/// let b = limiter.submit_with(fetch, "bar")?;
/// let (a, b) = tokio::join!(a, b);
/// ```
#[derive(Clone)]
pub struct Limiter {
    pub(super) shared: Arc<Shared>,
}

impl Limiter {
    /// Create a limiter that spawns tasks on the ambient tokio runtime.
    ///
    /// The ceiling is not validated here; a limiter built with 0 rejects
    /// every submission until [`set_concurrency`](Self::set_concurrency)
    /// gives it a positive ceiling.
    pub fn new(concurrency: usize) -> Self {
        Self::build(concurrency, None)
    }

    /// Create a limiter that always spawns tasks on `runtime`.
    pub fn with_runtime(concurrency: usize, runtime: Handle) -> Self {
        Self::build(concurrency, Some(runtime))
    }

    /// Create a limiter from loaded configuration.
    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(config.concurrency)
    }

    fn build(concurrency: usize, runtime: Option<Handle>) -> Self {
        let state = State {
            concurrency,
            active: HashSet::new(),
            pending: WaitList::new(),
            stats: LimiterStats::default(),
            last_runtime: None,
            starting: WaitList::new(),
            launching: false,
            next_id: 0,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                runtime,
            }),
        }
    }

    /// Number of tasks currently running.
    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    /// Number of tasks waiting to start.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.count()
    }

    /// Current concurrency ceiling.
    pub fn concurrency(&self) -> usize {
        self.lock().concurrency
    }

    /// Snapshot of counters and live queue state.
    pub fn stats(&self) -> LimiterStats {
        let state = self.lock();
        LimiterStats {
            active: state.active.len(),
            pending: state.pending.count(),
            concurrency: state.concurrency,
            ..state.stats
        }
    }

    /// Bookkeeping never panics while holding the lock, so a poisoned lock
    /// still guards consistent state.
    pub(super) fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the runtime to spawn on: the pinned one, else the caller's, else
    /// the last one used.
    pub(super) fn resolve_runtime(&self, state: &mut State) -> Option<Handle> {
        let handle = self
            .shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .or_else(|| state.last_runtime.clone())?;
        state.last_runtime = Some(handle.clone());
        Some(handle)
    }
}

impl fmt::Debug for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Limiter")
            .field("concurrency", &state.concurrency)
            .field("active", &state.active.len())
            .field("pending", &state.pending.count())
            .finish()
    }
}
