//! # Scheduler Module
//!
//! Execution side of the mailbox core: the seam drain tasks are submitted
//! through, and the fixed-size worker pool that runs them.
//!
//! ## Key Concepts
//! - Task executor: anything that accepts a boxed task and runs it later
//! - Worker pool: a fixed set of OS threads shared by every agent built on it
//! - Task queue: the pool's own FIFO of submitted tasks, distinct from any
//!   agent's mailbox
//!
//! The pool is always handed to agents explicitly. [`WorkerPool::global`]
//! provides a lazily built, process-wide instance for production code, while
//! tests build scoped pools and shut them down deterministically.

mod pool;
mod queue;
mod worker;

use std::fmt;

use crate::agent::error::PoolError;

pub use pool::{PoolMetrics, PoolStatus, WorkerPool};

/// Unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Common interface for anything that can run drain tasks
pub trait TaskExecutor: fmt::Debug + Send + Sync {
    /// Queue `task` for asynchronous execution without blocking the caller.
    ///
    /// A rejected task is dropped before this returns.
    fn execute(&self, task: Task) -> Result<(), PoolError>;
}
