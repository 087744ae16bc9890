use crate::errors::HandlerError;

// Type aliases shared by handlers and the mailbox core
pub type HandlerResult = Result<(), HandlerError>;

/// An executable payload. The worker that drains the mailbox runs it.
pub type Behavior = Box<dyn FnOnce() -> HandlerResult + Send + 'static>;
