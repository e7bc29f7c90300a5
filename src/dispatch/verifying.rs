//! Verifying Dispatch Strategy
//!
//! Launches every batch on two distinct workers and accepts a value only when
//! both return it independently. A pair is judged only once both members have
//! terminated:
//!
//! - either member failed outright -> evict that worker, requeue the batch;
//! - both succeeded but disagree -> requeue the batch and evict neither
//!   (either could be the liar, so disagreement alone blames no one);
//! - both agree -> fold the value once.
//!
//! The shared batch is requeued at most once per pair regardless of which
//! member triggered it.

use super::notifier::CompletionNotifier;
use super::pool::WorkerPool;
use super::queue::TaskQueue;
use super::runner::{BatchOutcome, BatchRunner};
use super::strategy::{CollectError, DispatchStrategy, LaunchError};
use crate::worker::BatchWorker;

use std::sync::Arc;

pub struct VerifyingStrategy {
    notifier: CompletionNotifier,
}

impl VerifyingStrategy {
    pub fn new() -> Self {
        Self {
            notifier: CompletionNotifier::new(),
        }
    }
}

impl Default for VerifyingStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: BatchWorker> DispatchStrategy<W> for VerifyingStrategy {
    fn has_enough_workers(&self, available: usize) -> bool {
        // Cross-checking needs two distinct workers per batch.
        available > 1
    }

    async fn launch_batch(
        &mut self,
        pool: &WorkerPool<W>,
        queue: &mut TaskQueue,
    ) -> Result<(), LaunchError> {
        let (first, second) = pool
            .pick_distinct_pair()
            .expect("pool size was checked before launching");

        let capacity_first = match first.worker.capacity().await {
            Ok(capacity) => capacity,
            Err(e) => {
                tracing::warn!("Capacity probe of {} failed: {}", first.name, e);
                return Err(LaunchError::InvalidWorker { name: first.name });
            }
        };
        let capacity_second = match second.worker.capacity().await {
            Ok(capacity) => capacity,
            Err(e) => {
                tracing::warn!("Capacity probe of {} failed: {}", second.name, e);
                return Err(LaunchError::InvalidWorker { name: second.name });
            }
        };

        // The pair shares one batch sized for its weaker member, plus the one
        // extra task probing the rejection boundary.
        let batch = Arc::new(queue.pop_batch(capacity_first.min(capacity_second) + 1));

        let (group, completions) = self.notifier.begin_group(2);
        BatchRunner::spawn(group, first, batch.clone(), completions.clone());
        BatchRunner::spawn(group, second, batch, completions);

        Ok(())
    }

    fn has_pending_results(&self) -> bool {
        self.notifier.has_outstanding()
    }

    async fn collect_result(&mut self, queue: &mut TaskQueue) -> Result<i64, CollectError> {
        let pair = self.notifier.next_complete_group().await;

        let mut agreed: Option<i64> = None;
        for done in &pair {
            match &done.outcome {
                BatchOutcome::Failed(_) => {
                    queue.push_batch(&done.batch);
                    return Err(CollectError::WorkerFailed {
                        name: done.worker.clone(),
                    });
                }
                BatchOutcome::Rejected => {
                    queue.push_batch(&done.batch);
                    return Err(CollectError::Overloaded);
                }
                BatchOutcome::Completed(value) => match agreed {
                    None => agreed = Some(*value),
                    Some(previous) if previous != *value => {
                        tracing::warn!(
                            "Workers disagreed ({} vs {}); discarding both results",
                            previous,
                            value
                        );
                        queue.push_batch(&done.batch);
                        return Err(CollectError::Disagreement);
                    }
                    Some(_) => {}
                },
            }
        }

        Ok(agreed.expect("a complete group is never empty"))
    }
}
