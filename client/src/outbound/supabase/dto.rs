//! DTOs for Supabase REST and auth payloads.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! values in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::{Identity, UserId};

/// PostgREST error body.
#[derive(Debug, Deserialize)]
pub(super) struct PostgrestErrorDto {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) details: Option<String>,
    #[serde(default)]
    pub(super) hint: Option<String>,
}

/// GoTrue error body; fields vary between server versions.
#[derive(Debug, Deserialize)]
pub(super) struct AuthErrorDto {
    #[serde(default)]
    pub(super) error_description: Option<String>,
    #[serde(default)]
    pub(super) msg: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

impl AuthErrorDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UserMetadataDto {
    #[serde(default)]
    pub(super) username: Option<String>,
    #[serde(default)]
    pub(super) avatar_url: Option<String>,
}

/// GoTrue user object.
#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: Option<UserMetadataDto>,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<Identity, String> {
        let id = UserId::new(&self.id).map_err(|error| format!("user {}: {error}", self.id))?;
        let metadata = self.user_metadata.unwrap_or_default();
        let username = metadata
            .username
            .filter(|username| !username.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_default();
        let mut identity = Identity::new(id, username);
        if let Some(email) = self.email {
            identity = identity.with_email(email);
        }
        if let Some(avatar_url) = metadata.avatar_url {
            identity = identity.with_avatar_url(avatar_url);
        }
        Ok(identity)
    }
}

/// Token grant response.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponseDto {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) refresh_token: Option<String>,
    pub(super) user: UserDto,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}
