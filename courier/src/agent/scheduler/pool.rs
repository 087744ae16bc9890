use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use tracing::warn;

use super::queue::{Job, TaskQueue};
use super::worker::Worker;
use super::{Task, TaskExecutor};
use crate::agent::config::WorkerPoolConfig;
use crate::agent::error::PoolError;
use crate::log_pool;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

lazy_static! {
    static ref GLOBAL_POOL: Result<Arc<WorkerPool>, PoolError> =
        WorkerPool::new(WorkerPoolConfig::default()).map(Arc::new);
}

/// Status codes for the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Accepting and running tasks
    Running = 0,

    /// Shutdown requested; new tasks are rejected
    ShuttingDown = 1,

    /// All workers have exited
    Shutdown = 2,

    /// Shutdown gave up waiting for some workers
    Error = 3,
}

impl PoolStatus {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => PoolStatus::Running,
            1 => PoolStatus::ShuttingDown,
            2 => PoolStatus::Shutdown,
            _ => PoolStatus::Error,
        }
    }
}

/// Point-in-time view of a pool
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Number of worker threads in the pool
    pub pool_size: usize,

    /// Jobs waiting in the task queue
    pub queued_tasks: usize,

    /// Tasks accepted since the pool started
    pub submitted_tasks: u64,

    /// Tasks that finished running, normally or by panicking
    pub completed_tasks: u64,

    /// Tasks that panicked
    pub panicked_tasks: u64,

    /// Workers currently running a task
    pub active_workers: usize,

    /// Current status of the pool
    pub status: PoolStatus,
}

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub panicked: AtomicU64,
    pub active_workers: AtomicUsize,
}

/// Fixed-size pool of worker threads shared by many agents
///
/// Workers pull tasks from one unbounded queue. When every worker is busy,
/// submitted tasks wait in that queue; submission itself never blocks.
///
/// # Lifecycle
/// - Threads are started by [`WorkerPool::new`] and never replaced
/// - [`WorkerPool::shutdown`] rejects new tasks, lets queued ones run, and
///   joins the workers
/// - Dropping a running pool signals the workers to exit without waiting
///
/// # Thread Safety
/// Submission touches only atomics and the lock-free queue. The mutex around
/// the join handles is taken by `shutdown` alone. Shutdown waits for
/// submissions already past the shutdown check, so every accepted task is
/// queued ahead of the terminate markers.
#[derive(Debug)]
pub struct WorkerPool {
    config: WorkerPoolConfig,

    /// Tasks waiting for a worker
    queue: TaskQueue,

    /// Join handles, emptied by shutdown
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Shutdown flag
    is_shutting_down: AtomicBool,

    /// Calls to `execute` between the shutdown check and the push
    submitting: AtomicUsize,

    /// Current `PoolStatus`
    status: AtomicUsize,

    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Create a pool and start its worker threads.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let queue = TaskQueue::new();
        let counters = Arc::new(PoolCounters::default());
        let mut workers = Vec::with_capacity(config.pool_size);

        for worker_id in 0..config.pool_size {
            let worker = Worker::new(config.thread_name(worker_id), queue.subscribe(), counters.clone());
            match worker.spawn() {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    for _ in 0..workers.len() {
                        queue.push_terminate();
                    }
                    crate::log_error!(err, pool = %config.name, "failed to start worker pool");
                    return Err(err);
                }
            }
        }

        log_pool!(config.name, "started", pool_size = config.pool_size);

        Ok(Self {
            config,
            queue,
            workers: Mutex::new(workers),
            is_shutting_down: AtomicBool::new(false),
            submitting: AtomicUsize::new(0),
            status: AtomicUsize::new(PoolStatus::Running as usize),
            counters,
        })
    }

    /// The process-wide pool, built on first use from `WorkerPoolConfig::default()`.
    ///
    /// It is never shut down; its threads end with the process.
    pub fn global() -> Result<Arc<WorkerPool>, PoolError> {
        GLOBAL_POOL.clone()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus::from_usize(self.status.load(Ordering::SeqCst))
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            pool_size: self.config.pool_size,
            queued_tasks: self.queue.len(),
            submitted_tasks: self.counters.submitted.load(Ordering::SeqCst),
            completed_tasks: self.counters.completed.load(Ordering::SeqCst),
            panicked_tasks: self.counters.panicked.load(Ordering::SeqCst),
            active_workers: self.counters.active_workers.load(Ordering::SeqCst),
            status: self.status(),
        }
    }

    /// True when every accepted task has finished running.
    pub fn is_quiescent(&self) -> bool {
        // `completed` first: it never exceeds `submitted`, so equality after
        // this order means nothing was queued or running at the first load.
        let completed = self.counters.completed.load(Ordering::SeqCst);
        let submitted = self.counters.submitted.load(Ordering::SeqCst);
        completed == submitted
    }

    /// Wait until [`is_quiescent`](Self::is_quiescent) holds or `timeout` elapses.
    pub fn await_quiescence(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_quiescent() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    /// Shut down using the configured `shutdown_timeout`.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        self.shutdown_within(self.config.shutdown_timeout)
    }

    /// Stop accepting tasks, let the queued ones finish, and join every worker.
    ///
    /// Calling it again after a completed shutdown is a no-op. Must not be
    /// called from one of this pool's own workers.
    pub fn shutdown_within(&self, timeout: Duration) -> Result<(), PoolError> {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.status.store(PoolStatus::ShuttingDown as usize, Ordering::SeqCst);
        log_pool!(self.config.name, "shutting_down");

        // Anyone still inside `execute` saw the flag clear and will push a
        // task; it must land before the terminate markers.
        while self.submitting.load(Ordering::SeqCst) != 0 {
            thread::yield_now();
        }

        let workers = mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for _ in 0..workers.len() {
            self.queue.push_terminate();
        }

        let deadline = Instant::now() + timeout;
        while !workers.iter().all(|handle| handle.is_finished()) {
            if Instant::now() >= deadline {
                self.status.store(PoolStatus::Error as usize, Ordering::SeqCst);
                warn!(pool = %self.config.name, ?timeout, "workers did not stop in time, detaching them");
                return Err(PoolError::ShutdownTimeout(timeout));
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }

        for handle in workers {
            if handle.join().is_err() {
                warn!(pool = %self.config.name, "worker thread ended with a panic");
            }
        }
        self.discard_leftovers();

        self.status.store(PoolStatus::Shutdown as usize, Ordering::SeqCst);
        log_pool!(self.config.name, "shutdown");
        Ok(())
    }

    /// Drop tasks no worker will ever take, counting them as completed.
    ///
    /// Dropping a drain task releases the claim it carries.
    fn discard_leftovers(&self) {
        let mut discarded = 0u64;
        for job in self.queue.drain() {
            if let Job::Run(task) = job {
                drop(task);
                discarded += 1;
            }
        }
        if discarded > 0 {
            self.counters.completed.fetch_add(discarded, Ordering::SeqCst);
            warn!(pool = %self.config.name, discarded, "dropped tasks left behind by shutdown");
        }
    }
}

impl TaskExecutor for WorkerPool {
    fn execute(&self, task: Task) -> Result<(), PoolError> {
        // Announce first, check second; `shutdown_within` does the reverse,
        // so at least one side sees the other.
        self.submitting.fetch_add(1, Ordering::SeqCst);
        let result = if self.is_shutting_down.load(Ordering::SeqCst) {
            Err(PoolError::ShutDown(self.config.name.clone()))
        } else {
            self.counters.submitted.fetch_add(1, Ordering::SeqCst);
            match self.queue.push(task) {
                Ok(()) => Ok(()),
                Err(_) => {
                    self.counters.submitted.fetch_sub(1, Ordering::SeqCst);
                    Err(PoolError::ShutDown(self.config.name.clone()))
                }
            }
        };
        self.submitting.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.is_shutting_down.swap(true, Ordering::SeqCst) {
            let workers = self.workers.get_mut().unwrap_or_else(PoisonError::into_inner);
            for _ in 0..workers.len() {
                self.queue.push_terminate();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    fn pool(name: &str, size: usize) -> WorkerPool {
        WorkerPool::new(WorkerPoolConfig::named(name, size)).unwrap()
    }

    #[test]
    fn test_runs_submitted_tasks() {
        let pool = pool("runs-tasks", 2);
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let runs = runs.clone();
            pool.execute(Box::new(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }

        assert!(pool.await_quiescence(Duration::from_secs(5)));
        assert_eq!(runs.load(Ordering::SeqCst), 10);

        let metrics = pool.metrics();
        assert_eq!(metrics.submitted_tasks, 10);
        assert_eq!(metrics.completed_tasks, 10);
        assert_eq!(metrics.status, PoolStatus::Running);
        pool.shutdown().unwrap();
    }

    #[test]
    fn test_tasks_run_on_named_workers() {
        let pool = pool("named", 3);
        let (tx, rx) = flume::unbounded();

        for _ in 0..6 {
            let tx = tx.clone();
            pool.execute(Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                let _ = tx.send(name);
            }))
            .unwrap();
        }

        let names: HashSet<_> = (0..6)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap())
            .collect();
        assert!(names.iter().all(|n| n.starts_with("named-worker-")));
        assert!(names.len() <= 3);
        pool.shutdown().unwrap();
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let pool = pool("panics", 1);
        let (tx, rx) = flume::unbounded();

        pool.execute(Box::new(|| panic!("task blew up"))).unwrap();
        pool.execute(Box::new(move || {
            let _ = tx.send("still alive");
        }))
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "still alive");
        assert!(pool.await_quiescence(Duration::from_secs(5)));
        assert_eq!(pool.metrics().panicked_tasks, 1);
        pool.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_runs_queued_then_rejects() {
        let pool = pool("shutdown", 1);
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let runs = runs.clone();
            pool.execute(Box::new(move || {
                thread::sleep(Duration::from_millis(5));
                runs.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }

        pool.shutdown_within(Duration::from_secs(5)).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 5);
        assert_eq!(pool.status(), PoolStatus::Shutdown);

        let rejected = pool.execute(Box::new(|| {}));
        assert_eq!(rejected, Err(PoolError::ShutDown("shutdown".to_string())));

        // Second call is a no-op.
        assert!(pool.shutdown().is_ok());
    }

    #[test]
    fn test_every_accepted_task_runs_despite_concurrent_shutdown() {
        for _ in 0..100 {
            let pool = Arc::new(pool("contended-shutdown", 2));
            let runs = Arc::new(AtomicUsize::new(0));

            let submitter = {
                let pool = pool.clone();
                let runs = runs.clone();
                thread::spawn(move || {
                    let mut accepted = 0;
                    loop {
                        let runs = runs.clone();
                        let task: Task = Box::new(move || {
                            runs.fetch_add(1, Ordering::SeqCst);
                        });
                        match pool.execute(task) {
                            Ok(()) => accepted += 1,
                            Err(_) => return accepted,
                        }
                    }
                })
            };

            pool.shutdown_within(Duration::from_secs(5)).unwrap();
            let accepted = submitter.join().unwrap();

            assert_eq!(runs.load(Ordering::SeqCst), accepted);
            assert!(pool.is_quiescent());
            assert_eq!(pool.metrics().queued_tasks, 0);
        }
    }

    #[test]
    fn test_shutdown_timeout() {
        let pool = pool("slow", 1);
        let (started_tx, started_rx) = flume::bounded(1);
        pool.execute(Box::new(move || {
            let _ = started_tx.send(());
            thread::sleep(Duration::from_millis(300));
        }))
        .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let result = pool.shutdown_within(Duration::from_millis(10));
        assert_eq!(result, Err(PoolError::ShutdownTimeout(Duration::from_millis(10))));
        assert_eq!(pool.status(), PoolStatus::Error);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = WorkerPool::new(WorkerPoolConfig::named("zero", 0));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_global_pool_is_shared() {
        let first = WorkerPool::global().unwrap();
        let second = WorkerPool::global().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), crate::agent::config::DEFAULT_POOL_NAME);
        assert!(first.pool_size() >= 1);
    }
}
