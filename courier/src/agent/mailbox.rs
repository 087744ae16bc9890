use std::fmt;

use crossbeam_queue::SegQueue;

/// Unbounded FIFO of pending messages for one agent.
///
/// Any number of threads may enqueue concurrently; removal is only performed
/// by the worker holding the agent's [`ActivationGate`](super::gate::ActivationGate)
/// claim. Both operations are lock-free and never block.
pub struct Mailbox<M> {
    queue: SegQueue<M>,
}

impl<M> Mailbox<M> {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Append `message` at the tail.
    #[inline]
    pub fn enqueue(&self, message: M) {
        self.queue.push(message);
    }

    /// Remove the head, if any.
    #[inline]
    pub fn try_dequeue(&self) -> Option<M> {
        self.queue.pop()
    }

    /// Snapshot; may be stale by the time it is used.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Snapshot; may be stale by the time it is used.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<M> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("len", &self.len()).finish()
    }
}
