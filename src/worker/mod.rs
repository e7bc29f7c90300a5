//! Calculation Worker Module
//!
//! A worker is a remote service exposing two operations: execute a batch of
//! tasks and report its capacity. Workers are benign-faulty (they may reject a
//! batch when overloaded, or become unreachable at any time) and, when started
//! in dishonest mode, Byzantine-faulty (they may silently corrupt results).
//!
//! ## Submodules
//! - **`calculator`**: The concrete worker implementation with capacity-based
//!   probabilistic rejection and optional result corruption.
//! - **`protocol`**: HTTP API contracts for the worker surface.
//! - **`handlers`**: axum handlers serving `execute` and `capacity`.
//! - **`client`**: `RemoteWorker`, the dispatcher-side HTTP client.

pub mod calculator;
pub mod client;
pub mod handlers;
pub mod protocol;

#[cfg(test)]
mod tests;

use crate::task::types::Task;
use std::future::Future;
use thiserror::Error;

/// How a worker call can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerCallError {
    /// The worker declared itself overloaded for this batch. Expected and
    /// recoverable: the tasks are simply redistributed.
    #[error("worker rejected the batch: overloaded")]
    Overloaded,
    /// Transport-level failure (connection refused, timeout, bad response).
    /// The worker is judged dead and must be evicted.
    #[error("worker unreachable: {0}")]
    Unreachable(String),
}

/// The remote worker contract.
///
/// Implemented by `RemoteWorker` (HTTP) for production and by in-process
/// calculators in tests. Futures are `Send` because batch executions run on
/// spawned runner tasks.
pub trait BatchWorker: Send + Sync + 'static {
    /// Executes a whole batch and returns the summed, mod-reduced result.
    fn execute_batch(
        &self,
        batch: Vec<Task>,
    ) -> impl Future<Output = Result<i64, WorkerCallError>> + Send;

    /// Self-reported maximum batch size before probabilistic rejection starts.
    /// Also doubles as the dispatcher's liveness probe, so implementations
    /// must not cache failures.
    fn capacity(&self) -> impl Future<Output = Result<usize, WorkerCallError>> + Send;
}
