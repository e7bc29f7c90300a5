//! Trusting Dispatch Strategy
//!
//! Assigns each batch to exactly one worker and takes the returned value at
//! face value. Tolerant of overload rejections (requeue, keep the worker) and
//! of worker death (requeue, evict), but defenseless against a worker that
//! lies: use the verifying strategy when workers cannot be trusted.

use super::pool::WorkerPool;
use super::queue::TaskQueue;
use super::runner::{BatchOutcome, BatchRunner, CompletedBatch};
use super::strategy::{CollectError, DispatchStrategy, LaunchError};
use crate::worker::BatchWorker;

use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct TrustingStrategy {
    completions_tx: UnboundedSender<CompletedBatch>,
    completions_rx: UnboundedReceiver<CompletedBatch>,
    outstanding: usize,
}

impl TrustingStrategy {
    pub fn new() -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            completions_tx,
            completions_rx,
            outstanding: 0,
        }
    }
}

impl Default for TrustingStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: BatchWorker> DispatchStrategy<W> for TrustingStrategy {
    fn has_enough_workers(&self, available: usize) -> bool {
        available > 0
    }

    async fn launch_batch(
        &mut self,
        pool: &WorkerPool<W>,
        queue: &mut TaskQueue,
    ) -> Result<(), LaunchError> {
        let handle = pool
            .pick_random()
            .expect("pool size was checked before launching");

        // Re-queried on every assignment on purpose: the probe detects death
        // before any tasks are committed to the worker.
        let capacity = match handle.worker.capacity().await {
            Ok(capacity) => capacity,
            Err(e) => {
                tracing::warn!("Capacity probe of {} failed: {}", handle.name, e);
                return Err(LaunchError::InvalidWorker { name: handle.name });
            }
        };

        // One task beyond the declared capacity probes the rejection boundary.
        let batch = Arc::new(queue.pop_batch(capacity + 1));

        BatchRunner::spawn(0, handle, batch, self.completions_tx.clone());
        self.outstanding += 1;

        Ok(())
    }

    fn has_pending_results(&self) -> bool {
        self.outstanding > 0
    }

    async fn collect_result(&mut self, queue: &mut TaskQueue) -> Result<i64, CollectError> {
        // The channel never closes while `completions_tx` is alive.
        let done = self
            .completions_rx
            .recv()
            .await
            .expect("strategy holds its own sender");
        self.outstanding -= 1;

        match done.outcome {
            BatchOutcome::Completed(value) => Ok(value),
            BatchOutcome::Rejected => {
                queue.push_batch(&done.batch);
                Err(CollectError::Overloaded)
            }
            BatchOutcome::Failed(_) => {
                queue.push_batch(&done.batch);
                Err(CollectError::WorkerFailed { name: done.worker })
            }
        }
    }
}
