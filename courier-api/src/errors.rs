//! # Handler Error Types
//!
//! Errors a [`MessageHandler`](crate::MessageHandler) returns when it could
//! not process a message. The mailbox core treats every error the same way:
//! the message counts as consumed, the failure is reported through the
//! agent's diagnostic channel, and draining continues with the next message.
//!
//! ## Usage Example
//!
//! ```rust
//! use courier_api::{HandlerError, HandlerResult};
//!
//! fn parse(raw: &str) -> HandlerResult {
//!     raw.parse::<u32>()
//!         .map(|_| ())
//!         .map_err(|e| HandlerError::rejected(format!("{raw}: {e}")))
//! }
//!
//! assert!(parse("42").is_ok());
//! assert!(matches!(parse("forty-two"), Err(HandlerError::Rejected(_))));
//! ```

use thiserror::Error;

/// Failure reported by a message handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler refused the payload as invalid for its current state.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The handler accepted the payload but could not complete the work.
    #[error("Message handling failed: {0}")]
    Failed(String),

    /// Any other error raised inside handler code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
