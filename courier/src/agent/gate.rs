use std::sync::atomic::{AtomicBool, Ordering};

/// Mutual-exclusion token guarding an agent's drain rights.
///
/// IDLE (`false`) moves to CLAIMED (`true`) only through a compare-and-set, so
/// exactly one contender wins. Only the winner moves it back, once, after its
/// drain work is finished.
#[derive(Debug, Default)]
pub struct ActivationGate {
    claimed: AtomicBool,
}

impl ActivationGate {
    pub const fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
        }
    }

    /// Atomically take drain rights. Returns `false` if someone else holds them.
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give drain rights back. Must only be called by the current holder.
    #[inline]
    pub fn release(&self) {
        self.claimed.store(false, Ordering::SeqCst);
    }

    /// Snapshot, for diagnostics only.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}
