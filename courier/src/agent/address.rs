use std::fmt;
use std::ops::Shl;
use std::sync::Arc;

use courier_api::MessageHandler;
use uuid::Uuid;

use crate::agent::config::AgentConfig;
use crate::agent::drain::{AgentCore, AgentStats};
use crate::agent::error::PoolError;
use crate::agent::scheduler::{TaskExecutor, WorkerPool};

/// Producer-facing handle to an agent's mailbox.
///
/// Cloning is cheap and every clone feeds the same mailbox. Messages are
/// handed to the agent's handler on a pool worker, one at a time, in the
/// order they entered the mailbox.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use courier::{AgentRef, HandlerResult, WorkerPool, WorkerPoolConfig};
///
/// let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::named("doc", 2)).unwrap());
/// let (tx, rx) = flume::unbounded();
///
/// let agent = AgentRef::new(
///     move |word: &'static str| -> HandlerResult {
///         let _ = tx.send(word.len());
///         Ok(())
///     },
///     pool.clone(),
/// );
///
/// agent.send("hello");
/// let _ = &agent << "mailbox" << "core";
///
/// let lengths: Vec<usize> = (0..3).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
/// assert_eq!(lengths, vec![5, 7, 4]);
/// pool.shutdown().unwrap();
/// ```
pub struct AgentRef<M: Send + 'static> {
    core: Arc<AgentCore<M>>,
}

impl<M: Send + 'static> AgentRef<M> {
    /// Create an agent draining into `handler` on `executor`.
    pub fn new<H>(handler: H, executor: Arc<dyn TaskExecutor>) -> Self
    where
        H: MessageHandler<M>,
    {
        Self::with_config(handler, executor, AgentConfig::default())
    }

    pub fn with_config<H>(handler: H, executor: Arc<dyn TaskExecutor>, config: AgentConfig) -> Self
    where
        H: MessageHandler<M>,
    {
        Self {
            core: Arc::new(AgentCore::new(handler, executor, config)),
        }
    }

    /// Create an agent on the process-wide [`WorkerPool::global`].
    pub fn on_default_pool<H>(handler: H) -> Result<Self, PoolError>
    where
        H: MessageHandler<M>,
    {
        let pool = WorkerPool::global()?;
        Ok(Self::new(handler, pool))
    }

    /// Enqueue `message` and make sure a worker will drain it.
    ///
    /// Never blocks and never fails; completion is not reported back.
    pub fn send(&self, message: M) {
        self.core.enqueue(message);
        self.core.schedule();
    }

    pub fn id(&self) -> Uuid {
        self.core.id()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Messages not yet taken by a worker (snapshot).
    pub fn pending_messages(&self) -> usize {
        self.core.pending_messages()
    }

    /// Whether a drain task currently holds the gate (snapshot).
    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    pub fn stats(&self) -> AgentStats {
        self.core.stats()
    }
}

/// `&agent << message` is `agent.send(message)`, and chains.
impl<'a, M: Send + 'static> Shl<M> for &'a AgentRef<M> {
    type Output = &'a AgentRef<M>;

    fn shl(self, message: M) -> Self::Output {
        self.send(message);
        self
    }
}

impl<M: Send + 'static> Clone for AgentRef<M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<M: Send + 'static> PartialEq for AgentRef<M> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl<M: Send + 'static> Eq for AgentRef<M> {}

impl<M: Send + 'static> fmt::Debug for AgentRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRef")
            .field("id", &self.core.id())
            .field("name", &self.core.name())
            .finish()
    }
}
