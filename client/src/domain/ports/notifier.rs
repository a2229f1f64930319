//! Driven port for transient user-visible notifications.

/// Success and failure toasts shown after an action completes.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Report a completed action.
    fn success(&self, message: &str);

    /// Report a failed action.
    fn failure(&self, message: &str);
}

/// Notifier that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn success(&self, _message: &str) {}

    fn failure(&self, _message: &str) {}
}
