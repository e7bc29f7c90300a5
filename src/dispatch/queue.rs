//! Pending Task Queue
//!
//! The mutable pool of tasks waiting to be assigned. Stack-like: batches are
//! popped off the top and failed batches are pushed back. Order is irrelevant
//! to correctness because the accumulated result is a commutative modular sum.
//!
//! The queue is owned exclusively by one `calculate_operations` call; it is
//! never shared across threads.

use crate::task::types::Task;

pub struct TaskQueue {
    tasks: Vec<Task>,
}

impl TaskQueue {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Pops up to `count` tasks; fewer when the queue holds fewer.
    pub fn pop_batch(&mut self, count: usize) -> Vec<Task> {
        let take = count.min(self.tasks.len());
        self.tasks.split_off(self.tasks.len() - take)
    }

    /// Returns a failed batch's tasks to the pending pool.
    pub fn push_batch(&mut self, batch: &[Task]) {
        self.tasks.extend_from_slice(batch);
    }
}
