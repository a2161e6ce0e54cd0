//! Limiter error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimiterError {
    /// The ceiling is not strictly positive. Carries the rejected value.
    #[error("concurrency must be greater than 0, got {0}")]
    InvalidConcurrency(usize),

    #[error("no tokio runtime available to run the task")]
    NoRuntime,
}
