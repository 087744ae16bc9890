//! # Message Handler Capability
//!
//! A [`MessageHandler`] is the entity-specific logic that receives each
//! message once the mailbox core has won the right to drain.
//!
//! ## Calling Guarantees
//! - Invoked on a borrowed pool thread, never on the sender's thread
//! - Invoked exactly once per payload passed to `send`, in mailbox order
//! - Never invoked concurrently for the same mailbox, hence `&mut self`
//!
//! Handlers should not block for long: the thread belongs to a pool shared
//! with every other mailbox.

use crate::types::{Behavior, HandlerResult};

/// Capability invoked with every message drained from a mailbox.
pub trait MessageHandler<M>: Send + 'static {
    /// Process one message.
    ///
    /// Returning an error (or panicking) marks the message as consumed; it is
    /// not retried.
    fn handle_message(&mut self, message: M) -> HandlerResult;
}

impl<M, F> MessageHandler<M> for F
where
    F: FnMut(M) -> HandlerResult + Send + 'static,
{
    fn handle_message(&mut self, message: M) -> HandlerResult {
        self(message)
    }
}

/// Handler for mailboxes whose payloads are [`Behavior`]s.
///
/// Each behavior runs on the draining worker, so behaviors sent to the same
/// mailbox execute one at a time and in send order.
#[derive(Debug, Default, Clone, Copy)]
pub struct BehaviorHandler;

impl MessageHandler<Behavior> for BehaviorHandler {
    fn handle_message(&mut self, behavior: Behavior) -> HandlerResult {
        behavior()
    }
}

/// Box a closure as a [`Behavior`] payload.
pub fn behavior<F>(f: F) -> Behavior
where
    F: FnOnce() -> HandlerResult + Send + 'static,
{
    Box::new(f)
}
