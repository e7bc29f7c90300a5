//! Dispatch Core Module
//!
//! The fault-tolerant dispatcher that drives a whole calculation: it takes a
//! snapshot of the registered workers, repeatedly assigns batches of pending
//! tasks, collects completions, and folds accepted results into a single
//! accumulated value modulo 4000.
//!
//! ## Architecture Overview
//! One dispatch round moves through two phases:
//! 1. **Assigning**: while tasks are pending, pick worker(s) at random, probe
//!    their capacity (the probe doubles as a liveness check), pop one task
//!    more than the declared capacity, and launch the batch asynchronously.
//! 2. **Draining**: collect completed batches in completion order. Declared
//!    overloads requeue their tasks and keep the worker; transport failures
//!    requeue and evict; a cross-check disagreement requeues and evicts
//!    neither (either worker could be the liar). Any of the three stops the
//!    round early and leads back to Assigning while tasks remain.
//!
//! The round fails fatally only when the pool falls below the strategy's
//! minimum size while tasks are still pending.
//!
//! ## Submodules
//! - **`queue`**: The pending task pool (stack-like, order irrelevant).
//! - **`pool`**: The worker pool snapshot with random selection.
//! - **`runner`**: `BatchRunner`, one spawned execution per outstanding batch.
//! - **`notifier`**: `CompletionNotifier`, grouped completion delivery for
//!   paired batches.
//! - **`strategy`**: The `DispatchStrategy` trait and its error types.
//! - **`trusting`**: Single-worker strategy that takes results at face value.
//! - **`verifying`**: Dual-worker strategy that cross-checks every batch.
//! - **`dispatcher`**: The driving loop plus registry-backed discovery.

pub mod dispatcher;
pub mod notifier;
pub mod pool;
pub mod queue;
pub mod runner;
pub mod strategy;
pub mod trusting;
pub mod verifying;

#[cfg(test)]
mod tests;
