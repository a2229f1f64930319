//! Authenticated identity as reported by the authentication provider.

use super::UserId;

/// The signed-in user.
///
/// Created by external authentication and never mutated by this crate.
///
/// # Examples
/// ```
/// use famspend::domain::{Identity, UserId};
///
/// let identity = Identity::new(UserId::random(), "ada").with_email("ada@example.com");
/// assert_eq!(identity.username(), "ada");
/// assert_eq!(identity.email(), Some("ada@example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: UserId,
    username: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl Identity {
    /// Construct an identity with a display username.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            avatar_url: None,
        }
    }

    /// Attach the account email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Attach an avatar reference.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Opaque user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Account email, when the provider exposes one.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Avatar reference, if any.
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}
