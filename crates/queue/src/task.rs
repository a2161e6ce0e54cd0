//! Task identities, deferred task records, and the caller-facing future.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Identity of a submitted task, unique within one limiter.
///
/// Ids are handed out in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw sequence number.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What a task's settlement channel carries: its value, or its panic payload.
type Settled<T> = std::thread::Result<T>;

/// How a launched task ended, as seen by the limiter's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Panicked,
}

type Start = Box<dyn FnOnce() -> BoxFuture<'static, Settlement> + Send>;

/// A finished task: how it ended, plus its result still waiting to be
/// handed to the caller.
///
/// Delivery is a separate step so the limiter can release the task's slot
/// before the caller's future resolves.
pub(crate) struct Settlement {
    pub(crate) outcome: Outcome,
    deliver: Box<dyn FnOnce() + Send>,
}

impl Settlement {
    fn new<T: Send + 'static>(settle: oneshot::Sender<Settled<T>>, result: Settled<T>) -> Self {
        let outcome = if result.is_ok() {
            Outcome::Completed
        } else {
            Outcome::Panicked
        };
        Self {
            outcome,
            deliver: Box::new(move || {
                // A dropped receiver just means nobody is waiting.
                let _ = settle.send(result);
            }),
        }
    }

    /// Resolve the caller's [`TaskFuture`].
    pub(crate) fn deliver(self) {
        (self.deliver)()
    }
}

/// A task with its arguments and settlement channel bound, ready to launch.
///
/// The concrete output type is erased so records of different tasks can
/// share one wait list.
pub(crate) struct TaskRecord {
    pub(crate) id: TaskId,
    start: Start,
}

impl TaskRecord {
    pub(crate) fn new<F, A, Fut, T>(
        id: TaskId,
        task: F,
        args: A,
        settle: oneshot::Sender<Settled<T>>,
    ) -> Self
    where
        F: FnOnce(A) -> Fut + Send + 'static,
        A: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let start: Start = Box::new(move || {
            // The closure runs synchronously on launch; a panic there settles
            // the caller just like a panic inside the returned future.
            let fut = match panic::catch_unwind(AssertUnwindSafe(move || task(args))) {
                Ok(fut) => fut,
                Err(payload) => {
                    return future::ready(Settlement::new(settle, Err(payload))).boxed();
                }
            };

            async move {
                let result = AssertUnwindSafe(fut).catch_unwind().await;
                Settlement::new(settle, result)
            }
            .boxed()
        });

        Self { id, start }
    }

    /// Invoke the task and return the future that drives it to settlement.
    pub(crate) fn start(self) -> BoxFuture<'static, Settlement> {
        (self.start)()
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Future returned by [`Limiter::submit`](crate::Limiter::submit).
///
/// Resolves to exactly what the task produced. If the task panicked, the
/// original panic is resumed in the task that polls this future.
///
/// If the task was discarded by
/// [`Limiter::clear_queue`](crate::Limiter::clear_queue) before it started,
/// this future never resolves.
#[must_use = "futures do nothing unless polled; the task itself still runs"]
pub struct TaskFuture<T> {
    id: TaskId,
    rx: oneshot::Receiver<Settled<T>>,
    abandoned: bool,
}

impl<T> TaskFuture<T> {
    pub(crate) fn new(id: TaskId, rx: oneshot::Receiver<Settled<T>>) -> Self {
        Self {
            id,
            rx,
            abandoned: false,
        }
    }

    /// The id assigned to this task at submission.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Future for TaskFuture<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if this.abandoned {
            return Poll::Pending;
        }

        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(value),
            Poll::Ready(Ok(Err(payload))) => panic::resume_unwind(payload),
            // Sender dropped without settling: the record was discarded.
            Poll::Ready(Err(_)) => {
                this.abandoned = true;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFuture")
            .field("id", &self.id)
            .field("abandoned", &self.abandoned)
            .finish()
    }
}
