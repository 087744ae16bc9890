//! # Drain Loop
//!
//! The scheduling loop that drains one mailbox on a shared pool.
//!
//! ## Protocol
//! - `schedule`: if the mailbox is non-empty and the gate can be claimed,
//!   submit exactly one [`DrainTask`]; otherwise do nothing
//! - `perform` (inside the task): take at most one message, hand it to the
//!   handler, then release the gate and call `schedule` again
//!
//! The trailing `schedule` picks up messages that arrived between the
//! dequeue and the release, so a non-empty mailbox never stays idle.
//!
//! ## State Machine
//! IDLE -> ACTIVE on a successful claim, ACTIVE -> IDLE on release. A release
//! followed immediately by a new claim (ACTIVE -> ACTIVE) is continuous
//! draining.

use std::cell::UnsafeCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;

use courier_api::MessageHandler;
use tracing::warn;
use uuid::Uuid;

use crate::agent::config::{AgentConfig, FailureHook};
use crate::agent::error::{panic_message, DeliveryFailure, FailureKind};
use crate::agent::gate::ActivationGate;
use crate::agent::mailbox::Mailbox;
use crate::agent::scheduler::TaskExecutor;
use crate::{agent_span, log_delivery, log_error, log_scheduler};

/// Delivery counters of one agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    /// Messages the handler processed without error
    pub delivered: u64,
    /// Messages whose handler returned an error or panicked
    pub failed: u64,
    /// Messages still waiting in the mailbox (snapshot)
    pub pending: usize,
}

pub(crate) struct AgentCore<M: Send + 'static> {
    id: Uuid,
    name: String,
    mailbox: Mailbox<M>,
    gate: ActivationGate,
    /// Only touched by the thread holding the gate claim.
    handler: UnsafeCell<Box<dyn MessageHandler<M> + Send>>,
    executor: Arc<dyn TaskExecutor>,
    failure_hook: Option<FailureHook>,
    delivered: AtomicU64,
    failed: AtomicU64,
}

// SAFETY: every field except `handler` is Sync. `handler` is dereferenced only
// in `deliver`, which runs between a successful `gate.try_claim()` and the
// matching `gate.release()`. The gate admits one holder at a time and its
// SeqCst claim/release order each handler call after the previous one.
unsafe impl<M: Send + 'static> Sync for AgentCore<M> {}

impl<M: Send + 'static> AgentCore<M> {
    pub fn new<H>(handler: H, executor: Arc<dyn TaskExecutor>, config: AgentConfig) -> Self
    where
        H: MessageHandler<M>,
    {
        let id = Uuid::new_v4();
        let name = config.name.unwrap_or_else(|| format!("agent-{}", id));

        Self {
            id,
            name,
            mailbox: Mailbox::new(),
            gate: ActivationGate::new(),
            handler: UnsafeCell::new(Box::new(handler)),
            executor,
            failure_hook: config.failure_hook,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pending_messages(&self) -> usize {
        self.mailbox.len()
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_claimed()
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            delivered: self.delivered.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            pending: self.mailbox.len(),
        }
    }

    pub fn enqueue(&self, message: M) {
        self.mailbox.enqueue(message);
    }

    /// Submit a drain task if there is work and nobody holds the gate.
    ///
    /// Safe to call from any thread at any time; a call with nothing to do is
    /// a no-op.
    pub fn schedule(self: &Arc<Self>) {
        // Pairs the emptiness check with the enqueue (producers) or the
        // release (workers) that precedes it on the same thread.
        fence(Ordering::SeqCst);

        if self.mailbox.is_empty() || !self.gate.try_claim() {
            return;
        }
        log_scheduler!(self.name, "claimed", pending = self.mailbox.len());

        let task = DrainTask::new(Arc::clone(self));
        if let Err(err) = self.executor.execute(Box::new(move || task.run())) {
            // The rejected task was dropped, which released the claim.
            warn!(agent = %self.name, error = %err, "drain task rejected, messages stay queued");
        }
    }

    /// Body of a drain task. The caller holds the gate claim.
    fn perform(self: &Arc<Self>) {
        if let Some(message) = self.mailbox.try_dequeue() {
            self.deliver(message);
        }

        self.gate.release();
        log_scheduler!(self.name, "released");
        self.schedule();
    }

    fn deliver(&self, message: M) {
        let span = agent_span!(self.name, self.id);
        let _guard = span.enter();

        // SAFETY: only reached from `perform`, whose caller holds the claim.
        let handler = unsafe { &mut *self.handler.get() };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_message(message)));

        match outcome {
            Ok(Ok(())) => {
                self.delivered.fetch_add(1, Ordering::SeqCst);
                log_delivery!(self.name, "handled");
            }
            Ok(Err(err)) => self.report_failure(FailureKind::Error(err)),
            Err(payload) => self.report_failure(FailureKind::Panic(panic_message(&*payload))),
        }
    }

    fn report_failure(&self, kind: FailureKind) {
        self.failed.fetch_add(1, Ordering::SeqCst);

        let failure = DeliveryFailure {
            agent_id: self.id,
            agent_name: self.name.clone(),
            kind,
        };
        log_error!(failure, agent = %self.name, panicked = failure.is_panic(), "message handling failed");

        if let Some(hook) = &self.failure_hook {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(&failure))).is_err() {
                warn!(agent = %self.name, "failure hook panicked");
            }
        }
    }
}

impl<M: Send + 'static> fmt::Debug for AgentCore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mailbox", &self.mailbox)
            .field("gate", &self.gate)
            .field("executor", &self.executor)
            .finish()
    }
}

/// Work item created after a successful claim.
///
/// Running it performs one drain step. Dropping it unrun (an executor that
/// rejected or discarded it) releases the claim instead.
struct DrainTask<M: Send + 'static> {
    core: Option<Arc<AgentCore<M>>>,
}

impl<M: Send + 'static> DrainTask<M> {
    fn new(core: Arc<AgentCore<M>>) -> Self {
        Self { core: Some(core) }
    }

    fn run(mut self) {
        if let Some(core) = self.core.take() {
            core.perform();
        }
    }
}

impl<M: Send + 'static> Drop for DrainTask<M> {
    fn drop(&mut self) {
        if let Some(core) = self.core.take() {
            core.gate.release();
            log_scheduler!(core.name, "released_unrun");
        }
    }
}
