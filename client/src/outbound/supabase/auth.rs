//! GoTrue session endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::client::{SessionTokens, SupabaseClient};
use super::dto::{AuthErrorDto, PasswordGrantDto, RefreshGrantDto, TokenResponseDto, UserDto};
use super::{body_preview, status_message};
use crate::domain::Identity;
use crate::domain::ports::{AuthEvent, AuthProvider, AuthProviderError};

impl SupabaseClient {
    /// Sign in with email and password, adopting the returned session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthProviderError::Rejected`] for refused credentials.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthProviderError> {
        let grant = self
            .token_grant("password", &PasswordGrantDto { email, password })
            .await?;
        let identity = grant
            .user
            .into_domain()
            .map_err(AuthProviderError::decode)?;
        *self.tokens.write().await = Some(SessionTokens::new(
            grant.access_token,
            grant.refresh_token,
        ));
        info!(user_id = %identity.id(), "signed in");
        self.emit(AuthEvent::SignedIn);
        Ok(identity)
    }

    /// Exchange the held refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthProviderError::Rejected`] when no refresh token is held
    /// or the provider refuses it. The same error is returned, and the new
    /// tokens dropped, if the session was ended or replaced mid-exchange.
    pub async fn refresh_session(&self) -> Result<(), AuthProviderError> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|tokens| tokens.refresh_token.clone())
            .ok_or_else(|| AuthProviderError::rejected("no refresh token is held"))?;
        let grant = self
            .token_grant(
                "refresh_token",
                &RefreshGrantDto {
                    refresh_token: refresh_token.as_str(),
                },
            )
            .await?;
        {
            let mut tokens = self.tokens.write().await;
            let still_held = tokens
                .as_ref()
                .and_then(|held| held.refresh_token.as_deref().map(String::as_str))
                == Some(refresh_token.as_str());
            if !still_held {
                debug!("session changed while refreshing; discarding new tokens");
                return Err(AuthProviderError::rejected("session ended during refresh"));
            }
            *tokens = Some(SessionTokens::new(grant.access_token, grant.refresh_token));
        }
        self.emit(AuthEvent::TokenRefreshed);
        Ok(())
    }

    /// End the session. Local tokens are cleared even if the request fails.
    ///
    /// # Errors
    ///
    /// Returns the logout request's failure, after clearing local state.
    pub async fn sign_out(&self) -> Result<(), AuthProviderError> {
        let Some(tokens) = self.tokens.write().await.take() else {
            return Ok(());
        };
        let result = self.logout(tokens.access_token.as_str()).await;
        if let Err(error) = &result {
            warn!(error = %error, "logout request failed; local session cleared");
        }
        self.emit(AuthEvent::SignedOut);
        result
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let endpoint = self
            .endpoint("auth/v1/logout")
            .map_err(|error| AuthProviderError::transport(format!("invalid auth endpoint: {error}")))?;
        let response = self
            .http
            .post(endpoint)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        // An already-expired session is as good as logged out.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }

    async fn token_grant<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<TokenResponseDto, AuthProviderError> {
        let endpoint = self
            .endpoint("auth/v1/token")
            .map_err(|error| AuthProviderError::transport(format!("invalid auth endpoint: {error}")))?;
        let response = self
            .http
            .post(endpoint)
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.anon_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        serde_json::from_slice(bytes.as_ref()).map_err(|error| {
            AuthProviderError::decode(format!("invalid token response: {error}"))
        })
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthProviderError> {
        let Some(access_token) = self.access_token().await else {
            return Ok(None);
        };
        let endpoint = self
            .endpoint("auth/v1/user")
            .map_err(|error| AuthProviderError::transport(format!("invalid auth endpoint: {error}")))?;
        let response = self
            .http
            .get(endpoint)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let user: UserDto = serde_json::from_slice(body.as_ref())
            .map_err(|error| AuthProviderError::decode(format!("invalid user payload: {error}")))?;
        user.into_domain()
            .map(Some)
            .map_err(AuthProviderError::decode)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events().subscribe()
    }
}

fn map_transport_error(error: reqwest::Error) -> AuthProviderError {
    if error.is_timeout() {
        AuthProviderError::timeout(error.to_string())
    } else {
        AuthProviderError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthProviderError {
    let message = serde_json::from_slice::<AuthErrorDto>(body)
        .ok()
        .and_then(AuthErrorDto::into_message)
        .unwrap_or_else(|| body_preview(body));

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AuthProviderError::timeout(status_message(status, &message))
        }
        _ if status.is_client_error() => AuthProviderError::rejected(message),
        _ => AuthProviderError::transport(status_message(status, &message)),
    }
}
