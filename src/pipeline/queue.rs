//! Task queue with drop-stale admission
//!
//! Holds the frames waiting for the worker. Admission clears the queue once it
//! already holds more than `evict_above` tasks, so a burst of submissions
//! collapses to the latest frame.

use std::collections::VecDeque;

use crate::capture::ImageFrame;

/// One unit of queued recognition work, owning its copy of the frame
#[derive(Debug)]
pub struct Task {
    /// Submission sequence number
    pub id: u64,
    /// Owned pixels
    pub frame: ImageFrame<'static>,
}

/// FIFO of pending tasks
#[derive(Debug)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
    evict_above: usize,
    next_id: u64,
}

impl TaskQueue {
    /// Create an empty queue that evicts once more than `evict_above` tasks are pending
    pub fn new(evict_above: usize) -> Self {
        Self {
            tasks: VecDeque::new(),
            evict_above,
            next_id: 0,
        }
    }

    /// Push a task, first clearing stale ones. Returns the new task id and the evicted tasks.
    pub fn admit(&mut self, frame: ImageFrame<'static>) -> (u64, Vec<Task>) {
        let evicted = if self.tasks.len() > self.evict_above {
            self.tasks.drain(..).collect()
        } else {
            Vec::new()
        };

        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push_back(Task { id, frame });
        (id, evicted)
    }

    /// Take the oldest pending task
    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Remove every pending task without running it
    pub fn drain(&mut self) -> Vec<Task> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Ids of pending tasks, oldest first
    pub fn pending_ids(&self) -> Vec<u64> {
        self.tasks.iter().map(|t| t.id).collect()
    }
}
