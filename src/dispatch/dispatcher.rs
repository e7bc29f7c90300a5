//! Dispatcher Driving Loop
//!
//! Owns one whole calculation: parse the input into a pending queue, snapshot
//! the registered workers once, then alternate between assigning batches and
//! draining completions until every task has been folded into the accumulated
//! modular sum.
//!
//! Worker faults are handled locally (requeue, evict, retry); only running
//! out of workers escapes to the caller, and then without any partial result.

use super::pool::{WorkerHandle, WorkerPool};
use super::queue::TaskQueue;
use super::strategy::{CollectError, DispatchStrategy, LaunchError};
use crate::registry::service::{NameRegistry, CALCULATOR_KIND};
use crate::task::parser::parse_tasks;
use crate::task::types::RESULT_MODULUS;
use crate::worker::client::RemoteWorker;
use crate::worker::BatchWorker;

use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Naming convention under which workers bind themselves in the registry.
pub const WORKER_NAME_PREFIX: &str = "calculator-";

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The pool fell below the strategy's minimum size while tasks were still
    /// pending. Fatal for the current calculation; nothing was accumulated
    /// for the caller.
    #[error("not enough workers left to finish the calculation")]
    InsufficientWorkers,
    #[error("failed to read the task input: {0}")]
    Input(#[from] std::io::Error),
}

/// Where the dispatcher gets its worker-pool snapshot and where evicted
/// workers get unbound.
pub trait WorkerSource {
    type Worker: BatchWorker;

    /// Enumerates the currently registered workers. Called once per
    /// calculation. Invalid entries are discarded and logged, never fatal.
    fn discover(&self) -> Vec<WorkerHandle<Self::Worker>>;

    /// Removes a worker judged dead from the underlying directory so later
    /// snapshots no longer see it.
    fn evict(&self, name: &str);
}

/// Discovery backed by the in-process name registry: every bound name with
/// the worker prefix whose entry advertises the calculator service kind
/// becomes a `RemoteWorker` handle.
pub struct RegistryWorkerSource {
    registry: Arc<NameRegistry>,
    http_client: reqwest::Client,
}

impl RegistryWorkerSource {
    pub fn new(registry: Arc<NameRegistry>) -> Self {
        Self {
            registry,
            http_client: reqwest::Client::new(),
        }
    }
}

impl WorkerSource for RegistryWorkerSource {
    type Worker = RemoteWorker;

    fn discover(&self) -> Vec<WorkerHandle<RemoteWorker>> {
        let mut handles = Vec::new();

        for name in self.registry.list() {
            if !name.starts_with(WORKER_NAME_PREFIX) {
                continue;
            }

            let Some(entry) = self.registry.lookup(&name) else {
                // Unregistered between list and lookup.
                tracing::warn!("Worker {} is no longer bound", name);
                continue;
            };

            if entry.kind != CALCULATOR_KIND {
                tracing::warn!(
                    "Invalid worker entry {}: advertises kind {:?}",
                    name,
                    entry.kind
                );
                continue;
            }

            let worker = Arc::new(RemoteWorker::new(entry.addr, self.http_client.clone()));
            handles.push(WorkerHandle::new(name, worker));
        }

        handles
    }

    fn evict(&self, name: &str) {
        if let Err(e) = self.registry.unregister(name) {
            tracing::debug!("Eviction of {} from the registry: {}", name, e);
        }
    }
}

pub struct Dispatcher<D, S> {
    source: D,
    strategy: S,
}

impl<D, S> Dispatcher<D, S>
where
    D: WorkerSource,
    S: DispatchStrategy<D::Worker>,
{
    pub fn new(source: D, strategy: S) -> Self {
        Self { source, strategy }
    }

    /// Calculates the accumulated result of every task read from `input`.
    ///
    /// The worker pool is snapshotted once at call start. The call returns
    /// `InsufficientWorkers` when the pool falls below the strategy's minimum
    /// size while tasks remain pending; in that case batches may still be in
    /// flight, so a fresh dispatcher should be built for the next attempt.
    pub async fn calculate_operations(
        &mut self,
        input: impl BufRead,
    ) -> Result<i64, DispatchError> {
        let started = Instant::now();

        let mut queue = TaskQueue::from_tasks(parse_tasks(input)?);
        let mut pool = WorkerPool::new(self.source.discover());
        tracing::info!(
            "Dispatching {} tasks across {} workers",
            queue.len(),
            pool.len()
        );

        let mut accumulated: i64 = 0;

        while !queue.is_empty() {
            // Assigning: drain the queue into outstanding batches.
            loop {
                if !self.strategy.has_enough_workers(pool.len()) {
                    return Err(DispatchError::InsufficientWorkers);
                }

                match self.strategy.launch_batch(&pool, &mut queue).await {
                    Ok(()) => {}
                    Err(LaunchError::InvalidWorker { name }) => {
                        tracing::warn!("Removing worker {}: failed capacity probe", name);
                        Self::evict(&self.source, &mut pool, &name);
                    }
                }

                if queue.is_empty() {
                    break;
                }
            }

            // Draining: fold completions until the round settles or a
            // recoverable error sends us back to Assigning.
            while self.strategy.has_pending_results() {
                match self.strategy.collect_result(&mut queue).await {
                    Ok(value) => {
                        accumulated = (accumulated + value) % RESULT_MODULUS;
                    }
                    Err(CollectError::Overloaded) => {
                        tracing::debug!("Batch rejected; redistributing its tasks");
                        break;
                    }
                    Err(CollectError::Disagreement) => {
                        tracing::warn!("Cross-check disagreement; redistributing the batch");
                        break;
                    }
                    Err(CollectError::WorkerFailed { name }) => {
                        tracing::warn!("Removing worker {}: batch call failed", name);
                        Self::evict(&self.source, &mut pool, &name);
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Calculation finished in {:?}: {}",
            started.elapsed(),
            accumulated
        );

        Ok(accumulated)
    }

    fn evict(source: &D, pool: &mut WorkerPool<D::Worker>, name: &str) {
        pool.remove(name);
        source.evict(name);
    }
}
