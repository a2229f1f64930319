//! Shared success/failure reporting for action dispatchers.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use super::ActionError;
use super::ports::{Notifier, Refetch, RpcError};

/// Runs one action as "backend call, notify, refetch", strictly in order.
#[derive(Clone)]
pub struct ActionReporter {
    notifier: Arc<dyn Notifier>,
    on_success: Option<Arc<dyn Refetch>>,
}

impl ActionReporter {
    /// Reporter that only notifies.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            on_success: None,
        }
    }

    /// Refetch `hook` after every successful action.
    #[must_use]
    pub fn with_on_success(mut self, hook: Arc<dyn Refetch>) -> Self {
        self.on_success = Some(hook);
        self
    }

    /// Await `call` and report its outcome.
    ///
    /// On success the notification is emitted before the refetch hook runs,
    /// and the hook completes before this returns. On failure the backend
    /// message is shown when present, otherwise `failure`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Backend`] wrapping the call's error.
    pub async fn run<T, F>(
        &self,
        action: &'static str,
        success: &str,
        failure: &str,
        call: F,
    ) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        match call.await {
            Ok(value) => {
                info!(action, "action succeeded");
                self.notifier.success(success);
                if let Some(hook) = &self.on_success {
                    hook.refetch().await;
                }
                Ok(value)
            }
            Err(error) => {
                warn!(action, error = %error, "action failed");
                self.notifier
                    .failure(error.backend_message().unwrap_or(failure));
                Err(ActionError::Backend(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Ordering and message selection for reported actions.
    use mockall::Sequence;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::ports::{MockNotifier, MockRefetch};

    #[tokio::test]
    async fn success_notifies_then_refetches() {
        let mut sequence = Sequence::new();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_success()
            .with(eq("Done"))
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());
        notifier.expect_failure().never();
        let mut refetch = MockRefetch::new();
        refetch
            .expect_refetch()
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());
        let reporter = ActionReporter::new(Arc::new(notifier)).with_on_success(Arc::new(refetch));

        let value = reporter
            .run("probe", "Done", "Failed", async { Ok::<_, RpcError>(7) })
            .await
            .expect("success");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn failure_prefers_backend_message_and_skips_refetch() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_failure()
            .with(eq("Invalid join code"))
            .times(1)
            .return_const(());
        let mut refetch = MockRefetch::new();
        refetch.expect_refetch().never();
        let reporter = ActionReporter::new(Arc::new(notifier)).with_on_success(Arc::new(refetch));
        let rejection = RpcError::rejected("join_family", "P0001", "Invalid join code");

        let error = reporter
            .run("probe", "Done", "Failed", async { Err::<(), _>(rejection.clone()) })
            .await
            .expect_err("failure");
        assert_eq!(error, ActionError::Backend(rejection));
    }

    #[tokio::test]
    async fn failure_falls_back_to_generic_message() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_failure()
            .with(eq("Failed"))
            .times(1)
            .return_const(());
        let reporter = ActionReporter::new(Arc::new(notifier));

        let result = reporter
            .run("probe", "Done", "Failed", async {
                Err::<(), _>(RpcError::timeout("slow"))
            })
            .await;
        assert!(matches!(result, Err(ActionError::Backend(RpcError::Timeout { .. }))));
    }

    #[tokio::test]
    async fn silent_reporter_still_propagates_failures() {
        use crate::domain::ports::SilentNotifier;

        let reporter = ActionReporter::new(Arc::new(SilentNotifier));
        let result: Result<(), _> = reporter
            .run("probe", "Done", "Failed", async {
                Err(RpcError::rejected("probe", "P0001", "nope"))
            })
            .await;
        assert!(matches!(result, Err(ActionError::Backend(RpcError::Rejected { .. }))));
    }
}
