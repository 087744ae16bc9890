use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::Receiver;
use tracing::subscriber::NoSubscriber;
use tracing::{debug, error, Dispatch};

use super::pool::PoolCounters;
use super::queue::Job;
use super::Task;
use crate::agent::error::{panic_message, PoolError};
use crate::logging;

/// One thread of a [`WorkerPool`](super::WorkerPool).
///
/// ## Core Algorithm
/// 1. Block on the pool's task queue
/// 2. Run the task, catching any panic so the thread survives it
/// 3. Exit on a `Terminate` job or when the queue disappears
pub(crate) struct Worker {
    name: String,
    receiver: Receiver<Job>,
    counters: Arc<PoolCounters>,
    /// Dispatcher of the creating thread, if it had one.
    dispatch: Option<Dispatch>,
}

impl Worker {
    pub fn new(name: String, receiver: Receiver<Job>, counters: Arc<PoolCounters>) -> Self {
        // Pinning the no-op dispatcher would hide a global subscriber
        // installed after the pool was built.
        let dispatch = logging::current_subscriber();
        let dispatch = (!dispatch.is::<NoSubscriber>()).then_some(dispatch);
        Self {
            name,
            receiver,
            counters,
            dispatch,
        }
    }

    /// Start the worker on a named OS thread.
    pub fn spawn(self) -> Result<JoinHandle<()>, PoolError> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || match self.dispatch.clone() {
                Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run_loop()),
                None => self.run_loop(),
            })
            .map_err(|e| PoolError::SpawnFailed(e.to_string()))
    }

    fn run_loop(self) {
        debug!(worker = %self.name, "worker started");

        while let Ok(job) = self.receiver.recv() {
            match job {
                Job::Run(task) => self.run_task(task),
                Job::Terminate => break,
            }
        }

        debug!(worker = %self.name, "worker stopped");
    }

    fn run_task(&self, task: Task) {
        self.counters.active_workers.fetch_add(1, Ordering::SeqCst);
        let result = panic::catch_unwind(AssertUnwindSafe(task));
        self.counters.active_workers.fetch_sub(1, Ordering::SeqCst);

        if let Err(payload) = result {
            self.counters.panicked.fetch_add(1, Ordering::SeqCst);
            error!(worker = %self.name, panic = %panic_message(&*payload), "task panicked");
        }
        // Counted last: quiescence checks rely on `completed` trailing everything
        // the task did, including submitting its successor.
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
    }
}
