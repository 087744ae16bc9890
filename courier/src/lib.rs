// Courier
//
// Lock-free single-consumer mailboxes. Any number of threads send to an
// agent without blocking; a shared, fixed-size pool of worker threads hands
// the agent's messages to its handler one at a time, in FIFO order.

pub mod agent;
pub mod logging;

// Re-export key types for easier usage
pub use agent::{
    default_pool_size, AgentConfig, AgentRef, AgentStats, DeliveryFailure, FailureHook, FailureKind, PoolError,
    PoolMetrics, PoolStatus, Task, TaskExecutor, WorkerPool, WorkerPoolConfig,
};
pub use courier_api::{behavior, Behavior, BehaviorHandler, HandlerError, HandlerResult, MessageHandler};
