//! Per-action "in flight" flag used to disable controls.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Flag that is set while at least one run of an action is in progress.
///
/// This is a presentation hint, not a lock: overlapping calls still proceed,
/// and the flag stays raised until the last of them finishes.
#[derive(Debug, Default)]
pub struct InFlight(AtomicUsize);

impl InFlight {
    /// Raise the flag until the returned guard drops.
    pub fn start(&self) -> InFlightGuard<'_> {
        self.0.fetch_add(1, Ordering::AcqRel);
        InFlightGuard(&self.0)
    }

    /// Whether any run of the action is in progress.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire) > 0
    }
}

/// Releases one run on drop, on every exit path.
#[must_use = "the flag clears as soon as the guard drops"]
pub struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
