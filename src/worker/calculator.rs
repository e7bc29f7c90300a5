//! Calculator Implementation
//!
//! Runs batches of tasks locally. Two fault behaviors are configurable:
//!
//! - **Overload**: a batch larger than the declared capacity is rejected with
//!   probability `(batch - capacity) / (5 * capacity)`, clamped to [0, 1],
//!   decided by a single uniform draw per call.
//! - **Dishonesty**: with an independent probability, the returned sum is
//!   perturbed by a bounded random offset without signaling any error. This
//!   is the corruption the verifying dispatch strategy exists to catch.

use super::{BatchWorker, WorkerCallError};
use crate::task::types::{Task, RESULT_MODULUS};

use rand::Rng;

/// Upper bound of the random offset added to a corrupted sum.
const CORRUPTION_MAX_OFFSET: i64 = 997;

pub struct Calculator {
    capacity: usize,
    dishonest_percent: f32,
}

impl Calculator {
    /// Creates a calculator that always accepts batches up to `capacity`
    /// tasks and lies about results `dishonest_percent` percent of the time
    /// (0 for an honest worker).
    pub fn new(capacity: usize, dishonest_percent: f32) -> Self {
        Self {
            capacity,
            dishonest_percent,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Probability of rejecting a batch of `batch_size` tasks.
    pub fn rejection_probability(&self, batch_size: usize) -> f64 {
        let excess = batch_size as f64 - self.capacity as f64;
        (excess / (5.0 * self.capacity as f64)).clamp(0.0, 1.0)
    }

    /// Rejection decision given one uniform draw in [0, 1).
    ///
    /// Split out from `run` so the statistical behavior is testable with a
    /// seeded generator.
    pub fn should_reject(&self, batch_size: usize, draw: f64) -> bool {
        draw < self.rejection_probability(batch_size)
    }

    /// Executes a batch synchronously.
    pub fn run(&self, batch: &[Task]) -> Result<i64, WorkerCallError> {
        let mut rng = rand::thread_rng();

        if self.should_reject(batch.len(), rng.gen::<f64>()) {
            tracing::debug!(
                "Rejecting batch of {} tasks (capacity {})",
                batch.len(),
                self.capacity
            );
            return Err(WorkerCallError::Overloaded);
        }

        let mut sum: i64 = 0;
        for task in batch {
            sum = (sum + task.execute()) % RESULT_MODULUS;
        }

        if self.dishonest_percent > 0.0
            && rng.gen::<f32>() < self.dishonest_percent / 100.0
        {
            let offset = rng.gen_range(1..=CORRUPTION_MAX_OFFSET);
            tracing::debug!("Corrupting result by {}", offset);
            sum += offset;
        }

        Ok(sum)
    }
}

impl BatchWorker for Calculator {
    async fn execute_batch(&self, batch: Vec<Task>) -> Result<i64, WorkerCallError> {
        self.run(&batch)
    }

    async fn capacity(&self) -> Result<usize, WorkerCallError> {
        Ok(self.capacity)
    }
}
