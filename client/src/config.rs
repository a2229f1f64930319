//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `FAMSPEND_*` environment variables and the configuration
//! file layer.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::outbound::supabase::{SessionTokens, SupabaseConfig};

/// Errors raised when settings cannot describe a usable backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No backend URL was configured.
    #[error("backend url is not configured (set FAMSPEND_BACKEND_URL)")]
    MissingBackendUrl,
    /// No anon key was configured.
    #[error("anon key is not configured (set FAMSPEND_ANON_KEY)")]
    MissingAnonKey,
    /// The backend URL did not parse.
    #[error("backend url `{url}` is invalid: {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    /// The backend URL is not http or https.
    #[error("backend url `{url}` must use http or https")]
    UnsupportedScheme { url: String },
}

/// Settings for the client and terminal front end.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FAMSPEND")]
pub struct ClientSettings {
    /// Supabase project URL.
    pub backend_url: Option<String>,
    /// Public anon key of the project.
    pub anon_key: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
    /// Existing access token to adopt at startup.
    pub access_token: Option<String>,
    /// Refresh token paired with `access_token`.
    pub refresh_token: Option<String>,
    /// Email used for password sign-in.
    pub email: Option<String>,
    /// Password used for password sign-in.
    pub password: Option<String>,
    /// Emit logs as JSON. Read through [`ClientSettings::log_json`].
    pub log_json: Option<bool>,
}

impl ClientSettings {
    /// Whether logs are emitted as JSON. Off unless set.
    pub fn log_json(&self) -> bool {
        self.log_json.unwrap_or(false)
    }

    /// Validate connection settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the URL or key is missing or the URL is
    /// malformed.
    pub fn supabase_config(&self) -> Result<SupabaseConfig, ConfigError> {
        let raw_url = non_blank(self.backend_url.as_deref()).ok_or(ConfigError::MissingBackendUrl)?;
        let anon_key = non_blank(self.anon_key.as_deref()).ok_or(ConfigError::MissingAnonKey)?;
        let url = Url::parse(raw_url).map_err(|error| ConfigError::InvalidBackendUrl {
            url: raw_url.to_owned(),
            reason: error.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                url: raw_url.to_owned(),
            });
        }
        Ok(SupabaseConfig {
            url,
            anon_key: Zeroizing::new(anon_key.to_owned()),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        })
    }

    /// Session to adopt at startup, when an access token is configured.
    pub fn session_tokens(&self) -> Option<SessionTokens> {
        non_blank(self.access_token.as_deref()).map(|access_token| {
            SessionTokens::new(
                access_token,
                non_blank(self.refresh_token.as_deref()).map(str::to_owned),
            )
        })
    }

    /// Email and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, Zeroizing<String>)> {
        let email = non_blank(self.email.as_deref())?;
        let password = self.password.as_deref().filter(|password| !password.is_empty())?;
        Some((email, Zeroizing::new(password.to_owned())))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
