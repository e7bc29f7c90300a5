//! Completion Notifier
//!
//! Delivers runner completions to the dispatching task, grouped: a group is
//! surfaced only once every runner in it has reached a terminal state. Early
//! finishers are buffered until their partners arrive, and complete groups
//! are handed out FIFO by group completion order (not launch order).
//!
//! Runner tasks write only to the mpsc channel; all grouping state is owned
//! by the dispatching task, so no locking is needed beyond the channel.

use super::runner::{CompletedBatch, GroupId};

use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct CompletionNotifier {
    tx: UnboundedSender<CompletedBatch>,
    rx: UnboundedReceiver<CompletedBatch>,
    /// Outstanding group -> expected member count.
    expected: HashMap<GroupId, usize>,
    /// Early finishers waiting for the rest of their group.
    partial: HashMap<GroupId, Vec<CompletedBatch>>,
    /// Fully terminated groups, FIFO by completion.
    ready: VecDeque<Vec<CompletedBatch>>,
    next_group: GroupId,
}

impl CompletionNotifier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            expected: HashMap::new(),
            partial: HashMap::new(),
            ready: VecDeque::new(),
            next_group: 0,
        }
    }

    /// Registers a new group of `size` runners and returns its id together
    /// with the sender each runner must report on.
    pub fn begin_group(&mut self, size: usize) -> (GroupId, UnboundedSender<CompletedBatch>) {
        let group = self.next_group;
        self.next_group += 1;
        self.expected.insert(group, size);
        (group, self.tx.clone())
    }

    /// Whether any launched group has not yet been collected.
    pub fn has_outstanding(&self) -> bool {
        !self.expected.is_empty() || !self.ready.is_empty()
    }

    /// Blocks until a whole group has terminated and returns it. Must only be
    /// called while `has_outstanding` is true.
    pub async fn next_complete_group(&mut self) -> Vec<CompletedBatch> {
        loop {
            if let Some(group) = self.ready.pop_front() {
                return group;
            }

            // The channel never closes while `self.tx` is alive.
            let done = self
                .rx
                .recv()
                .await
                .expect("notifier holds its own sender");
            self.accept(done);
        }
    }

    fn accept(&mut self, done: CompletedBatch) {
        let group = done.group;
        let Some(&size) = self.expected.get(&group) else {
            tracing::warn!("Completion for unknown group {} dropped", group);
            return;
        };

        let members = self.partial.entry(group).or_default();
        members.push(done);

        if members.len() == size {
            let complete = self
                .partial
                .remove(&group)
                .expect("group was just inserted");
            self.expected.remove(&group);
            self.ready.push_back(complete);
        }
    }
}

impl Default for CompletionNotifier {
    fn default() -> Self {
        Self::new()
    }
}
