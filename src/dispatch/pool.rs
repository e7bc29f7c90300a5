//! Worker Pool
//!
//! The dispatcher's snapshot of workers currently believed reachable, taken
//! once per calculation from the registry. Handles are removed (never mutated)
//! when a worker is judged dead; the pool never knowingly contains a dead
//! worker.

use crate::worker::BatchWorker;

use rand::Rng;
use std::sync::Arc;

/// A remote worker currently believed reachable, identified by its registry
/// name.
pub struct WorkerHandle<W> {
    pub name: String,
    pub worker: Arc<W>,
}

impl<W> WorkerHandle<W> {
    pub fn new(name: impl Into<String>, worker: Arc<W>) -> Self {
        Self {
            name: name.into(),
            worker,
        }
    }
}

impl<W> Clone for WorkerHandle<W> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            worker: self.worker.clone(),
        }
    }
}

pub struct WorkerPool<W> {
    handles: Vec<WorkerHandle<W>>,
}

impl<W: BatchWorker> WorkerPool<W> {
    pub fn new(handles: Vec<WorkerHandle<W>>) -> Self {
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Uniform random choice among the pool.
    pub fn pick_random(&self) -> Option<WorkerHandle<W>> {
        if self.handles.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..self.handles.len());
        Some(self.handles[idx].clone())
    }

    /// Two uniform random picks, re-drawing the second until it differs from
    /// the first. Requires at least two workers in the pool.
    pub fn pick_distinct_pair(&self) -> Option<(WorkerHandle<W>, WorkerHandle<W>)> {
        if self.handles.len() < 2 {
            return None;
        }

        let mut rng = rand::thread_rng();
        let first = rng.gen_range(0..self.handles.len());
        let mut second = rng.gen_range(0..self.handles.len());
        while second == first {
            second = rng.gen_range(0..self.handles.len());
        }

        Some((self.handles[first].clone(), self.handles[second].clone()))
    }

    /// Drops the handle bound under `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.handles.len();
        self.handles.retain(|handle| handle.name != name);
        self.handles.len() != before
    }
}
