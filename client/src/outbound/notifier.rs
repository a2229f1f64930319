//! Tracing-backed notification adapter.

use tracing::{info, warn};

use crate::domain::ports::Notifier;

/// Emits notifications as log events on the `famspend::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "famspend::notify", notification = message, "action succeeded");
    }

    fn failure(&self, message: &str) {
        warn!(target: "famspend::notify", notification = message, "action failed");
    }
}
