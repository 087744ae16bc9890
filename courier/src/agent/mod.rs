#![doc = " Single-consumer mailboxes drained by a shared worker pool."]

pub mod address;
pub mod config;
pub mod drain;
pub mod error;
pub mod gate;
pub mod mailbox;
pub mod scheduler;

pub use address::AgentRef;
pub use config::{default_pool_size, AgentConfig, FailureHook, WorkerPoolConfig};
pub use drain::AgentStats;
pub use error::{DeliveryFailure, FailureKind, PoolError};
pub use gate::ActivationGate;
pub use mailbox::Mailbox;
pub use scheduler::{PoolMetrics, PoolStatus, Task, TaskExecutor, WorkerPool};
