//! Batch Runner
//!
//! The concurrency primitive behind an outstanding batch: one spawned task per
//! remote call. A runner executes its call to completion (no cancellation is
//! ever propagated), then reports exactly one `CompletedBatch` on the shared
//! completion channel and disappears.

use super::pool::WorkerHandle;
use crate::task::types::Task;
use crate::worker::{BatchWorker, WorkerCallError};

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Identifies the fixed-size runner group a batch belongs to. The trusting
/// strategy launches singleton groups; the verifying strategy launches pairs.
pub type GroupId = u64;

/// Terminal state of one worker call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The worker returned a value. The value is only as trustworthy as the
    /// worker itself.
    Completed(i64),
    /// The worker declared itself overloaded. Expected; the worker stays.
    Rejected,
    /// Transport-level failure; the worker is presumed dead.
    Failed(String),
}

/// Produced exactly once per runner, consumed exactly once by the strategy.
///
/// The batch is shared (`Arc`) between the members of a group so a failed
/// group can requeue its tasks exactly once.
pub struct CompletedBatch {
    pub group: GroupId,
    pub worker: String,
    pub batch: Arc<Vec<Task>>,
    pub outcome: BatchOutcome,
}

pub struct BatchRunner;

impl BatchRunner {
    /// Launches one asynchronous batch execution against `handle` and returns
    /// immediately. The completion report is delivered on `completions`.
    pub fn spawn<W: BatchWorker>(
        group: GroupId,
        handle: WorkerHandle<W>,
        batch: Arc<Vec<Task>>,
        completions: UnboundedSender<CompletedBatch>,
    ) {
        tokio::spawn(async move {
            tracing::debug!(
                "Running batch of {} tasks on worker {}",
                batch.len(),
                handle.name
            );

            let outcome = match handle.worker.execute_batch((*batch).clone()).await {
                Ok(value) => BatchOutcome::Completed(value),
                Err(WorkerCallError::Overloaded) => BatchOutcome::Rejected,
                Err(WorkerCallError::Unreachable(reason)) => {
                    tracing::warn!("Worker {} failed: {}", handle.name, reason);
                    BatchOutcome::Failed(reason)
                }
            };

            // The receiver only disappears when the whole calculation was
            // abandoned; the report is moot then.
            let _ = completions.send(CompletedBatch {
                group,
                worker: handle.name,
                batch,
                outcome,
            });
        });
    }
}
