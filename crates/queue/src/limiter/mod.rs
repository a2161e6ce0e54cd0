//! Bounded-concurrency limiter -- admission, completion, and ceiling control.
//!
//! Split into focused submodules:
//! - `core`: Limiter handle, shared state, constructors, and introspection
//! - `admission`: submitting tasks (run now or queue)
//! - `completion`: launching tasks and promoting queued work when one settles
//! - `control`: changing the ceiling and clearing the queue

mod admission;
mod completion;
mod control;
mod core;

pub use self::core::Limiter;
