//! One-shot cancellation signal
//!
//! Tells the tasks of a session that the session has ended.
//! Firing is idempotent: only the first call reports that it fired.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Broadcast, fire-once stop signal shared by the tasks of one session
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.
    ///
    /// Returns `true` only for the call that actually fired it; later or
    /// concurrent calls are no-ops and return `false`.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the signal has fired
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the signal has fired (immediately if it already has)
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
