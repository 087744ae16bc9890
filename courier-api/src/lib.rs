//! # Courier API
//!
//! Contract between the Courier mailbox core and the code that gives
//! messages their meaning.
//!
//! The core never looks inside a payload. Everything it knows about a
//! message is that it can be moved to a worker thread and handed to a
//! [`MessageHandler`]. This crate defines that capability and the small
//! vocabulary around it.
//!
//! ## Core Components
//!
//! - [`MessageHandler`]: the single-method capability invoked once per message
//! - [`Behavior`] / [`BehaviorHandler`]: executable payloads run on the worker
//! - [`HandlerError`] / [`HandlerResult`]: how a handler reports failure
//!
//! ## Usage Example
//!
//! ```rust
//! use courier_api::{HandlerResult, MessageHandler};
//!
//! struct Counter {
//!     total: u64,
//! }
//!
//! impl MessageHandler<u64> for Counter {
//!     fn handle_message(&mut self, amount: u64) -> HandlerResult {
//!         self.total += amount;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`handler`]: handler capability and behavior payloads
//! - [`errors`]: handler error types
//! - [`types`]: common type aliases

pub mod errors;
pub mod handler;
pub mod types;

pub use errors::HandlerError;
pub use handler::{behavior, BehaviorHandler, MessageHandler};
pub use types::{Behavior, HandlerResult};
