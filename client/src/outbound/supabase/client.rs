//! The single Supabase session client.
//!
//! Construct one per process, share it behind an `Arc`, and call
//! [`SupabaseClient::dispose`] at shutdown.

use std::time::Duration;

use reqwest::{Client, Url};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::AuthEvent;

const AUTH_EVENT_CAPACITY: usize = 16;

/// Connection settings for one Supabase project.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: Url,
    /// Public anon key sent as `apikey`.
    pub anon_key: Zeroizing<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Access and refresh tokens of the signed-in session.
#[derive(Clone)]
pub struct SessionTokens {
    pub(super) access_token: Zeroizing<String>,
    pub(super) refresh_token: Option<Zeroizing<String>>,
}

impl SessionTokens {
    /// Wrap tokens obtained elsewhere.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: refresh_token.map(Zeroizing::new),
        }
    }
}

/// Reqwest-backed gateway and auth provider for one Supabase project.
pub struct SupabaseClient {
    pub(super) http: Client,
    base_url: Url,
    pub(super) anon_key: Zeroizing<String>,
    pub(super) tokens: RwLock<Option<SessionTokens>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url: with_trailing_slash(config.url),
            anon_key: config.anon_key,
            tokens: RwLock::new(None),
            events,
        })
    }

    /// Adopt an existing session and announce the sign-in.
    pub async fn set_session(&self, tokens: SessionTokens) {
        *self.tokens.write().await = Some(tokens);
        self.emit(AuthEvent::SignedIn);
    }

    /// Whether a session is held.
    pub async fn has_session(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Drop the held session without contacting the backend.
    pub async fn dispose(&self) {
        self.tokens.write().await.take();
    }

    pub(super) fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    pub(super) async fn access_token(&self) -> Option<Zeroizing<String>> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    /// Access token when signed in, otherwise the anon key.
    pub(super) async fn bearer(&self) -> Zeroizing<String> {
        match self.access_token().await {
            Some(token) => token,
            None => self.anon_key.clone(),
        }
    }

    pub(super) fn events(&self) -> &broadcast::Sender<AuthEvent> {
        &self.events
    }

    pub(super) fn emit(&self, event: AuthEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "no auth event subscribers");
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
