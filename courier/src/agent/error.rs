use std::any::Any;
use std::time::Duration;

use courier_api::HandlerError;
use thiserror::Error;
use uuid::Uuid;

/// Errors related to the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool '{0}' is shut down")]
    ShutDown(String),
    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    #[error("Worker pool shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
}

/// Why a message was consumed without being handled successfully.
#[derive(Error, Debug)]
pub enum FailureKind {
    #[error("handler returned an error: {0}")]
    Error(#[from] HandlerError),
    #[error("handler panicked: {0}")]
    Panic(String),
}

/// A handler failure, reported to the agent's diagnostic channel.
#[derive(Error, Debug)]
#[error("Delivery to agent '{agent_name}' failed: {kind}")]
pub struct DeliveryFailure {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub kind: FailureKind,
}

impl DeliveryFailure {
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panic(_))
    }
}

/// Render a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
