use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::error::{DeliveryFailure, PoolError};

/// Environment variable consulted by [`default_pool_size`].
pub const POOL_SIZE_ENV: &str = "COURIER_POOL_SIZE";

pub const DEFAULT_POOL_NAME: &str = "courier-pool";

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Callback receiving every handler failure of an agent.
///
/// Runs on the worker that drained the failing message, while the agent's
/// claim is still held.
pub type FailureHook = Arc<dyn Fn(&DeliveryFailure) + Send + Sync>;

// --- Pool sizing ---

/// Default number of worker threads.
///
/// `COURIER_POOL_SIZE` wins when it holds a positive integer; otherwise one
/// more than the number of logical CPUs.
pub fn default_pool_size() -> usize {
    pool_size_from(std::env::var(POOL_SIZE_ENV).ok().as_deref())
}

fn pool_size_from(configured: Option<&str>) -> usize {
    configured
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|size| *size > 0)
        .unwrap_or_else(|| num_cpus::get() + 1)
}

// --- Pool Configuration ---

/// Configuration for a [`WorkerPool`](crate::agent::scheduler::WorkerPool).
#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    /// Pool name, also the prefix of worker thread names.
    pub name: String,

    /// The number of worker threads. Fixed for the pool's lifetime.
    pub pool_size: usize,

    /// How long `WorkerPool::shutdown` waits for workers to exit.
    pub shutdown_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            pool_size: default_pool_size(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl WorkerPoolConfig {
    pub fn named(name: impl Into<String>, pool_size: usize) -> Self {
        Self {
            name: name.into(),
            pool_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.pool_size == 0 {
            return Err(PoolError::InvalidConfig("pool_size must be at least 1".to_string()));
        }
        if self.name.is_empty() {
            return Err(PoolError::InvalidConfig("name must not be empty".to_string()));
        }
        Ok(())
    }

    pub(crate) fn thread_name(&self, worker_id: usize) -> String {
        format!("{}-worker-{}", self.name, worker_id)
    }
}

// --- Agent Configuration ---

/// Per-agent settings.
#[derive(Clone, Default)]
pub struct AgentConfig {
    /// Name used in logs and failure reports. Defaults to `agent-<id>`.
    pub name: Option<String>,

    /// Structured failure callback, invoked in addition to error logging.
    pub failure_hook: Option<FailureHook>,
}

impl AgentConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            failure_hook: None,
        }
    }

    pub fn with_failure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DeliveryFailure) + Send + Sync + 'static,
    {
        self.failure_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("failure_hook", &self.failure_hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}
