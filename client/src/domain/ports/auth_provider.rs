//! Driven port for the authentication provider.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::define_port_error;
use crate::domain::Identity;

/// Authentication state changes reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

define_port_error! {
    /// Errors surfaced while asking the provider about the session.
    pub enum AuthProviderError {
        /// Network transport failed.
        Transport { message: String } =>
            "auth transport failed: {message}",
        /// The provider did not answer in time.
        Timeout { message: String } =>
            "auth call timed out: {message}",
        /// The provider refused the request.
        Rejected { message: String } =>
            "auth provider rejected the request: {message}",
        /// The provider answered with an unexpected shape.
        Decode { message: String } =>
            "auth response decode failed: {message}",
    }
}

/// Port exposing the current identity and a stream of auth state changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Identity of the signed-in user, `None` when signed out.
    async fn current_identity(&self) -> Result<Option<Identity>, AuthProviderError>;

    /// Subscribe to future auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Fixture provider that is permanently signed out.
#[derive(Debug)]
pub struct FixtureAuthProvider {
    events: broadcast::Sender<AuthEvent>,
}

impl Default for FixtureAuthProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

#[async_trait]
impl AuthProvider for FixtureAuthProvider {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthProviderError> {
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
