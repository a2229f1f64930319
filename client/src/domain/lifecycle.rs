//! Commit guard for asynchronous reads.
//!
//! A read takes a [`LoadTicket`] before it awaits the backend and may only
//! publish its result while that ticket is the newest one issued and the owner
//! has not been disposed. Overlapping reads therefore resolve to the result of
//! the most recently started read, whatever order the responses arrive in.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

/// Generation issued to one asynchronous read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Generation counter plus the disposed signal of one read model.
#[derive(Debug)]
pub struct Lifecycle {
    generation: AtomicU64,
    disposed: watch::Sender<bool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        let (disposed, _) = watch::channel(false);
        Self {
            generation: AtomicU64::new(0),
            disposed,
        }
    }
}

impl Lifecycle {
    /// Start a read, superseding every earlier ticket.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether a read holding `ticket` may still commit.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        !self.is_disposed() && self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Stop accepting commits.
    ///
    /// Wakes every task parked in [`Lifecycle::disposed`].
    pub fn dispose(&self) {
        self.disposed.send_replace(true);
    }

    /// Whether [`Lifecycle::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        *self.disposed.borrow()
    }

    /// Resolve once [`Lifecycle::dispose`] has been called.
    pub async fn disposed(&self) {
        let mut changes = self.disposed.subscribe();
        if changes.wait_for(|disposed| *disposed).await.is_err() {
            debug!("lifecycle dropped before disposal");
        }
    }
}
