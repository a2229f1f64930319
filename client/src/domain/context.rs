//! Server-derived session context.
//!
//! The context is the single canonical bundle of identity, profile and
//! family-membership facts for the signed-in user. It is produced fresh on
//! each session refresh and replaced wholesale, never patched.

use std::fmt;

use rust_decimal::Decimal;

use super::{Family, FamilyId, FamilyRole, UserId};

/// Errors raised when a context row breaks the membership invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValidationError {
    /// A role was reported without a family.
    RoleWithoutFamily,
    /// A family was reported without a role.
    FamilyWithoutRole,
    /// A family was reported without a name.
    FamilyWithoutName,
}

impl fmt::Display for ContextValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleWithoutFamily => write!(f, "context has a role but no family"),
            Self::FamilyWithoutRole => write!(f, "context has a family but no role"),
            Self::FamilyWithoutName => write!(f, "context has a family but no family name"),
        }
    }
}

impl std::error::Error for ContextValidationError {}

/// Family facts carried by the context when the user belongs to a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    family_id: FamilyId,
    role: FamilyRole,
    family_name: String,
    join_code: Option<String>,
    monthly_spending_limit: Option<Decimal>,
}

impl Membership {
    /// Construct membership facts.
    pub fn new(family_id: FamilyId, role: FamilyRole, family_name: impl Into<String>) -> Self {
        Self {
            family_id,
            role,
            family_name: family_name.into(),
            join_code: None,
            monthly_spending_limit: None,
        }
    }

    /// Attach the family's join code.
    #[must_use]
    pub fn with_join_code(mut self, join_code: impl Into<String>) -> Self {
        self.join_code = Some(join_code.into());
        self
    }

    /// Attach the family's monthly spending limit.
    #[must_use]
    pub fn with_spending_limit(mut self, limit: Decimal) -> Self {
        self.monthly_spending_limit = Some(limit);
        self
    }

    /// Build membership from the nullable columns of a context row.
    ///
    /// Returns `Ok(None)` when neither a family nor a role is present.
    pub fn from_columns(
        family_id: Option<FamilyId>,
        role: Option<FamilyRole>,
        family_name: Option<String>,
        join_code: Option<String>,
        monthly_spending_limit: Option<Decimal>,
    ) -> Result<Option<Self>, ContextValidationError> {
        match (family_id, role) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ContextValidationError::RoleWithoutFamily),
            (Some(_), None) => Err(ContextValidationError::FamilyWithoutRole),
            (Some(family_id), Some(role)) => {
                let family_name = family_name.ok_or(ContextValidationError::FamilyWithoutName)?;
                Ok(Some(Self {
                    family_id,
                    role,
                    family_name,
                    join_code,
                    monthly_spending_limit,
                }))
            }
        }
    }

    /// Family identifier.
    pub fn family_id(&self) -> &FamilyId {
        &self.family_id
    }

    /// Caller's role in the family.
    pub const fn role(&self) -> FamilyRole {
        self.role
    }

    /// Family display name.
    pub fn family_name(&self) -> &str {
        self.family_name.as_str()
    }

    /// Current join code.
    pub fn join_code(&self) -> Option<&str> {
        self.join_code.as_deref()
    }

    /// Monthly spending limit.
    pub const fn monthly_spending_limit(&self) -> Option<Decimal> {
        self.monthly_spending_limit
    }
}

/// Read-only projection of the caller's identity and membership.
///
/// ## Invariants
/// - `role()` is `Some` if and only if `family_id()` is `Some`; both come
///   from the same optional [`Membership`].
///
/// # Examples
/// ```
/// use famspend::domain::{FamilyId, FamilyRole, Membership, UserContext, UserId};
///
/// let lonely = UserContext::new(UserId::random(), "ada", None, None);
/// assert!(lonely.family_id().is_none() && lonely.role().is_none());
///
/// let member = UserContext::new(
///     UserId::random(),
///     "ada",
///     None,
///     Some(Membership::new(FamilyId::random(), FamilyRole::Admin, "Smiths")),
/// );
/// assert_eq!(member.role(), Some(FamilyRole::Admin));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
    username: String,
    avatar_url: Option<String>,
    membership: Option<Membership>,
}

impl UserContext {
    /// Construct a context.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        avatar_url: Option<String>,
        membership: Option<Membership>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            avatar_url,
            membership,
        }
    }

    /// Profile user id.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Profile username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Profile avatar reference.
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Membership facts, when the user belongs to a family.
    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    /// Family identifier.
    pub fn family_id(&self) -> Option<&FamilyId> {
        self.membership.as_ref().map(Membership::family_id)
    }

    /// Role in the family.
    pub fn role(&self) -> Option<FamilyRole> {
        self.membership.as_ref().map(Membership::role)
    }

    /// Family name.
    pub fn family_name(&self) -> Option<&str> {
        self.membership.as_ref().map(Membership::family_name)
    }

    /// Family join code.
    pub fn join_code(&self) -> Option<&str> {
        self.membership.as_ref().and_then(Membership::join_code)
    }

    /// Family monthly spending limit.
    pub fn monthly_spending_limit(&self) -> Option<Decimal> {
        self.membership
            .as_ref()
            .and_then(Membership::monthly_spending_limit)
    }

    /// Whether the user administers their family.
    pub fn is_admin(&self) -> bool {
        self.role() == Some(FamilyRole::Admin)
    }
}

impl Family {
    /// Derive the family read model from the session context.
    ///
    /// Pure; returns `Some` exactly when the context carries a family id.
    pub fn from_context(context: &UserContext) -> Option<Self> {
        context.membership().map(|membership| Self {
            id: membership.family_id().clone(),
            name: membership.family_name().to_owned(),
            join_code: membership.join_code().map(str::to_owned),
            monthly_spending_limit: membership.monthly_spending_limit(),
            created_at: None,
        })
    }
}
