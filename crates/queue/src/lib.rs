//! Bounded-concurrency task scheduling for tokio.
//!
//! A [`Limiter`] runs at most N submitted futures at a time. Extra
//! submissions wait in a FIFO [`WaitList`] and start, in order, as running
//! tasks settle.

pub mod error;
pub mod limiter;
pub mod stats;
pub mod task;
pub mod wait_list;

pub use conqueue_core::LimiterConfig;
pub use error::LimiterError;
pub use limiter::Limiter;
pub use stats::LimiterStats;
pub use task::{TaskFuture, TaskId};
pub use wait_list::WaitList;
