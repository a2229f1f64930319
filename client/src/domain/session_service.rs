//! Session resolver: authenticated identity plus the canonical context.
//!
//! Each refresh asks the auth provider for the identity and, when one exists,
//! loads the context through `get_my_context` in a single round trip. Failures
//! never escape: they are logged and degrade to "no context".

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::lifecycle::Lifecycle;
use super::ports::{AuthProvider, Procedure};
use super::{BackendProcedures, Identity, UserContext};

/// Observable session read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Signed-in identity.
    pub identity: Option<Identity>,
    /// Server-derived context, `None` when unavailable.
    pub context: Option<UserContext>,
    /// Whether a refresh is running. Starts `true`.
    pub loading: bool,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            identity: None,
            context: None,
            loading: true,
        }
    }

    /// Whether an identity is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Resolves and publishes the current session.
pub struct SessionResolver {
    auth: Arc<dyn AuthProvider>,
    procedures: BackendProcedures,
    state: watch::Sender<SessionState>,
    lifecycle: Lifecycle,
}

impl SessionResolver {
    /// Build a resolver in the initial loading state. Call
    /// [`SessionResolver::refresh`] to perform the first load.
    pub fn new(auth: Arc<dyn AuthProvider>, procedures: BackendProcedures) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            auth,
            procedures,
            state,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Current session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe wholesale replacements of the session state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Whether an identity is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Re-resolve identity and context, replacing both wholesale.
    ///
    /// When refreshes overlap, the most recently started one wins.
    pub async fn refresh(&self) {
        let ticket = self.lifecycle.begin();
        self.state.send_if_modified(|state| {
            let changed = !state.loading;
            state.loading = true;
            changed
        });

        let (identity, context) = self.resolve().await;

        if !self.lifecycle.is_current(ticket) {
            debug!("dropping superseded session refresh");
            return;
        }
        self.state.send_replace(SessionState {
            identity,
            context,
            loading: false,
        });
    }

    async fn resolve(&self) -> (Option<Identity>, Option<UserContext>) {
        let identity = match self.auth.current_identity().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return (None, None),
            Err(error) => {
                warn!(error = %error, "failed to resolve the signed-in identity");
                return (None, None);
            }
        };

        match self.procedures.my_context().await {
            Ok(context) => (Some(identity), context),
            Err(error) => {
                warn!(
                    procedure = %Procedure::GetMyContext,
                    error = %error,
                    "failed to load session context"
                );
                (Some(identity), None)
            }
        }
    }

    /// Resolve once no refresh is running.
    pub async fn wait_until_loaded(&self) {
        let mut changes = self.state.subscribe();
        let lifecycle = &self.lifecycle;
        let waited = changes
            .wait_for(|state| !state.loading || lifecycle.is_disposed())
            .await;
        if waited.is_err() {
            debug!("session state channel closed while waiting");
        }
    }

    /// Refresh whenever the auth provider reports a state change.
    ///
    /// The task ends when the provider's event channel closes or the
    /// resolver is disposed.
    pub fn follow_auth_events(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.auth.subscribe();
        let resolver = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    () = resolver.lifecycle.disposed() => break,
                    received = events.recv() => received,
                };
                match received {
                    Ok(event) => debug!(?event, "auth state changed"),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "auth events lagged; refreshing once");
                    }
                    Err(RecvError::Closed) => break,
                }
                resolver.refresh().await;
            }
            debug!("auth event follower stopped");
        })
    }

    /// Stop committing results. Pending waiters are released.
    pub fn dispose(&self) {
        self.lifecycle.dispose();
        self.state.send_modify(|_| {});
    }
}

#[cfg(test)]
mod tests {
    //! Session refresh behaviour against mocked ports.
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;
    use serde_json::Value;
    use tokio::sync::{Notify, broadcast};

    use super::*;
    use crate::domain::ports::{
        AuthEvent, AuthProviderError, MockAuthProvider, MockRpcGateway, RpcError, RpcGateway,
    };
    use crate::domain::test_fixtures::{
        auth_reporting, context_row, expect_procedure, identity, procedures,
    };

    fn resolver(auth: MockAuthProvider, gateway: MockRpcGateway) -> SessionResolver {
        SessionResolver::new(Arc::new(auth), procedures(gateway))
    }

    #[tokio::test]
    async fn starts_loading_and_unauthenticated() {
        let resolver = resolver(auth_reporting(None), MockRpcGateway::new());
        let state = resolver.snapshot();
        assert!(state.loading);
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn signed_out_skips_the_context_call() {
        let mut gateway = MockRpcGateway::new();
        gateway.expect_call().never();
        let resolver = resolver(auth_reporting(None), gateway);

        resolver.refresh().await;

        let state = resolver.snapshot();
        assert_eq!(state.identity, None);
        assert_eq!(state.context, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn zero_rows_mean_authenticated_without_context() {
        let mut gateway = MockRpcGateway::new();
        expect_procedure(&mut gateway, Procedure::GetMyContext, 1, Ok(serde_json::json!([])));
        let resolver = resolver(auth_reporting(Some(identity())), gateway);

        resolver.refresh().await;

        assert!(resolver.is_authenticated());
        assert_eq!(resolver.snapshot().context, None);
    }

    #[tokio::test]
    async fn context_failure_degrades_to_no_context() {
        let mut gateway = MockRpcGateway::new();
        expect_procedure(
            &mut gateway,
            Procedure::GetMyContext,
            1,
            Err(RpcError::transport("connection refused")),
        );
        let resolver = resolver(auth_reporting(Some(identity())), gateway);

        resolver.refresh().await;

        let state = resolver.snapshot();
        assert_eq!(state.identity, Some(identity()));
        assert_eq!(state.context, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn auth_failure_clears_identity_and_context() {
        let mut auth = MockAuthProvider::new();
        auth.expect_current_identity()
            .returning(|| Err(AuthProviderError::timeout("auth slow")));
        let mut gateway = MockRpcGateway::new();
        gateway.expect_call().never();
        let resolver = resolver(auth, gateway);

        resolver.refresh().await;

        let state = resolver.snapshot();
        assert_eq!(state.identity, None);
        assert_eq!(state.context, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn role_is_present_exactly_when_family_is() {
        let mut gateway = MockRpcGateway::new();
        let calls = AtomicUsize::new(0);
        gateway.expect_call().times(3).returning(move |_, _| {
            let in_family = calls.fetch_add(1, Ordering::SeqCst) % 2 == 0;
            Ok(context_row("ada", in_family))
        });
        let resolver = resolver(auth_reporting(Some(identity())), gateway);

        for _ in 0..3 {
            resolver.refresh().await;
            let context = resolver.snapshot().context.expect("context row");
            assert_eq!(context.role().is_some(), context.family_id().is_some());
        }
    }

    /// Gateway whose first call blocks until released.
    struct GatedGateway {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RpcGateway for GatedGateway {
        async fn call(&self, _procedure: Procedure, _args: Value) -> Result<Value, RpcError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
                Ok(context_row("stale", false))
            } else {
                Ok(context_row("fresh", false))
            }
        }
    }

    #[tokio::test]
    async fn newest_refresh_wins_over_late_responses() {
        let gateway = Arc::new(GatedGateway {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let resolver = SessionResolver::new(
            Arc::new(auth_reporting(Some(identity()))),
            BackendProcedures::new(gateway.clone()),
        );

        tokio::join!(resolver.refresh(), async {
            tokio::task::yield_now().await;
            resolver.refresh().await;
            gateway.gate.notify_one();
        });

        let context = resolver.snapshot().context.expect("context row");
        assert_eq!(context.username(), "fresh");
        assert!(!resolver.snapshot().loading);
    }

    #[tokio::test]
    async fn disposed_resolver_ignores_results() {
        let mut gateway = MockRpcGateway::new();
        expect_procedure(&mut gateway, Procedure::GetMyContext, 1, Ok(context_row("ada", true)));
        let resolver = resolver(auth_reporting(Some(identity())), gateway);

        resolver.dispose();
        resolver.refresh().await;
        resolver.wait_until_loaded().await;

        assert_eq!(resolver.snapshot().identity, None);
    }

    #[rstest]
    #[case::signed_in(AuthEvent::SignedIn, true)]
    #[case::token_refreshed(AuthEvent::TokenRefreshed, true)]
    #[case::signed_out(AuthEvent::SignedOut, false)]
    #[tokio::test]
    async fn auth_events_trigger_refresh(#[case] event: AuthEvent, #[case] signed_in_after: bool) {
        let (events, receiver) = broadcast::channel(4);
        let lookups = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&lookups);
        let mut auth = MockAuthProvider::new();
        auth.expect_current_identity().returning(move || {
            let first = counted.fetch_add(1, Ordering::SeqCst) == 0;
            Ok((first || signed_in_after).then(identity))
        });
        auth.expect_subscribe().return_once(move || receiver);
        let mut gateway = MockRpcGateway::new();
        gateway
            .expect_call()
            .withf(|procedure, _| *procedure == Procedure::GetMyContext)
            .returning(|_, _| Ok(context_row("ada", true)));
        let resolver = Arc::new(resolver(auth, gateway));
        resolver.refresh().await;
        assert!(resolver.is_authenticated());
        let mut changes = resolver.subscribe();

        let task = resolver.follow_auth_events();
        events.send(event).expect("listener subscribed");
        changes
            .wait_for(|state| !state.loading && lookups.load(Ordering::SeqCst) == 2)
            .await
            .expect("state published");
        drop(events);
        task.await.expect("listener stops when the channel closes");

        let state = resolver.snapshot();
        assert_eq!(state.is_authenticated(), signed_in_after);
        assert_eq!(state.context.is_some(), signed_in_after);
    }

    #[tokio::test]
    async fn follower_stops_once_disposed() {
        let (events, receiver) = broadcast::channel::<AuthEvent>(4);
        let mut auth = MockAuthProvider::new();
        auth.expect_subscribe().return_once(move || receiver);
        let mut gateway = MockRpcGateway::new();
        gateway.expect_call().never();
        let resolver = Arc::new(resolver(auth, gateway));

        let task = resolver.follow_auth_events();
        tokio::task::yield_now().await;
        resolver.dispose();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("follower ends after dispose")
            .expect("follower task");
        assert_eq!(events.receiver_count(), 0);
        assert_eq!(Arc::strong_count(&resolver), 1);
    }

    #[tokio::test]
    async fn wait_until_loaded_returns_once_disposed() {
        let resolver = resolver(auth_reporting(None), MockRpcGateway::new());
        assert!(resolver.snapshot().loading);

        let (waited, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(1), resolver.wait_until_loaded()),
            async {
                tokio::task::yield_now().await;
                resolver.dispose();
            }
        );

        waited.expect("waiter released by dispose");
        assert!(resolver.snapshot().loading);
    }

    #[tokio::test]
    async fn fixture_adapters_resolve_to_signed_out() {
        use crate::domain::ports::{FixtureAuthProvider, FixtureRpcGateway};

        let resolver = SessionResolver::new(
            Arc::new(FixtureAuthProvider::default()),
            BackendProcedures::new(Arc::new(FixtureRpcGateway)),
        );
        resolver.refresh().await;

        let state = resolver.snapshot();
        assert!(!state.loading);
        assert!(!state.is_authenticated());
        assert!(state.context.is_none());
    }
}
