use std::fmt;

use flume::{Drain, Receiver, SendError, Sender};

use super::Task;

/// Entry of the pool's task queue.
pub(crate) enum Job {
    Run(Task),
    /// Ends exactly one worker loop.
    Terminate,
}

/// Unbounded FIFO shared by all workers of a pool.
///
/// Workers block on the receiving side, so an idle pool costs no CPU. The
/// queue keeps a receiver of its own, which means sends only fail once the
/// queue itself is gone.
pub(crate) struct TaskQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    pub fn push(&self, task: Task) -> Result<(), SendError<Job>> {
        self.sender.send(Job::Run(task))
    }

    /// Ask one worker to exit after the jobs already queued ahead of it.
    pub fn push_terminate(&self) {
        // Cannot fail while `self.receiver` is alive.
        let _ = self.sender.send(Job::Terminate);
    }

    /// Receiving handle for a new worker.
    pub fn subscribe(&self) -> Receiver<Job> {
        self.receiver.clone()
    }

    /// Take every job still queued.
    pub fn drain(&self) -> Drain<'_, Job> {
        self.receiver.drain()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}
