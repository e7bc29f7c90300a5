//! Dispatch Strategy Contract
//!
//! The polymorphic seam between the driving loop and the two fault-tolerance
//! strategies. Each strategy owns its own bookkeeping (outstanding runners,
//! completion plumbing); the loop only sees the four operations below.

use super::pool::WorkerPool;
use super::queue::TaskQueue;
use crate::worker::BatchWorker;

use thiserror::Error;

/// A launch attempt that consumed no tasks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    /// The selected worker failed its capacity probe and must be evicted
    /// before selection restarts.
    #[error("worker {name} failed its capacity probe")]
    InvalidWorker { name: String },
}

/// A collect attempt that did not produce a foldable value. Every variant
/// guarantees the affected batch was already pushed back onto the queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    /// A worker declared itself overloaded. Recoverable; keep the worker.
    #[error("a worker declared itself overloaded")]
    Overloaded,
    /// A worker call failed outright. Recoverable, but the worker must go.
    #[error("worker {name} failed during a batch")]
    WorkerFailed { name: String },
    /// Two paired workers returned different values. Either could be lying,
    /// so neither is blamed; the batch is simply retried.
    #[error("paired workers disagreed on a result")]
    Disagreement,
}

#[allow(async_fn_in_trait)]
pub trait DispatchStrategy<W: BatchWorker> {
    /// Minimum-pool-size policy: whether a round can proceed with `available`
    /// workers.
    fn has_enough_workers(&self, available: usize) -> bool;

    /// Selects worker(s), probes capacity, pops a batch one task beyond the
    /// declared capacity, and launches it asynchronously. Never blocks on the
    /// execution itself. On `Err` no tasks were consumed.
    async fn launch_batch(
        &mut self,
        pool: &WorkerPool<W>,
        queue: &mut TaskQueue,
    ) -> Result<(), LaunchError>;

    /// Whether any launched batch has not yet been judged.
    fn has_pending_results(&self) -> bool;

    /// Blocks until the next batch (or batch group) terminates and judges it.
    /// On `Err` the affected tasks were already requeued.
    async fn collect_result(&mut self, queue: &mut TaskQueue) -> Result<i64, CollectError>;
}
