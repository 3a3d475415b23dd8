use std::fmt;

use crossbeam_queue::SegQueue;
use tracing::{debug, info, warn};

use taskpool_api::Task;

/// A FIFO of pending tasks shared by the coordinator and every worker.
///
/// Workers drain it until [`SharedQueue::dequeue`] reports empty; emptiness is
/// the normal termination signal, so nothing here ever waits.
///
/// # Thread Safety
/// - Backed by a lock-free, linearizable MPMC queue (`SegQueue`)
/// - A task is handed to at most one successful `dequeue`
/// - Enqueues from one thread are dequeued in that thread's program order
///
/// # Performance Characteristics
/// - O(1) enqueue and dequeue
/// - No lock is held across a worker's processing step
#[derive(Default)]
pub struct SharedQueue {
    tasks: SegQueue<Task>,
}

impl fmt::Debug for SharedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedQueue")
            .field("len", &self.tasks.len())
            .finish()
    }
}

impl SharedQueue {
    pub fn new() -> Self {
        Self {
            tasks: SegQueue::new(),
        }
    }

    /// Appends `task` at the tail.
    ///
    /// # Returns
    /// * `true` - The task was accepted
    /// * `false` - The task was empty; the queue is unchanged
    pub fn enqueue(&self, task: impl Into<Task>) -> bool {
        let task = task.into();
        if task.is_empty() {
            warn!("Rejected empty task");
            return false;
        }

        info!(task = %task, "Added task to queue");
        self.tasks.push(task);
        true
    }

    /// Like [`SharedQueue::enqueue`], with a missing task rejected the same
    /// way as an empty one.
    pub fn offer(&self, task: Option<Task>) -> bool {
        match task {
            Some(task) => self.enqueue(task),
            None => {
                warn!("Rejected missing task");
                false
            }
        }
    }

    /// Removes and returns the head of the queue.
    ///
    /// # Returns
    /// * `Some(task)` - The oldest remaining task, now owned by the caller
    /// * `None` - The queue was empty at the point of the call
    pub fn dequeue(&self) -> Option<Task> {
        let task = self.tasks.pop();
        if task.is_none() {
            debug!("Queue is empty");
        }
        task
    }

    /// Snapshot of the number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Snapshot of emptiness.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
