//! Family, membership and member-management types.
//!
//! The read-side types (`Family`, `FamilyMember`) are wholesale-replaced
//! projections of backend state. The input-side types (`FamilyName`,
//! `JoinCode`, `SpendingLimit`) validate form input locally so an invalid
//! submission never reaches the backend.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FamilyId, UserId};

/// Maximum length, in characters, of family and category names.
pub const NAME_MAX: usize = 64;

/// Validation errors for family form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptyJoinCode,
    JoinCodeContainsWhitespace,
    NegativeSpendingLimit,
    ConfirmationMismatch,
}

impl fmt::Display for FamilyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "family name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "family name must be at most {max} characters")
            }
            Self::EmptyJoinCode => write!(f, "join code must not be empty"),
            Self::JoinCodeContainsWhitespace => {
                write!(f, "join code must not contain whitespace")
            }
            Self::NegativeSpendingLimit => {
                write!(f, "monthly spending limit must not be negative")
            }
            Self::ConfirmationMismatch => {
                write!(f, "confirmation text must match the family name")
            }
        }
    }
}

impl std::error::Error for FamilyValidationError {}

/// Role of a member within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    /// May edit the family and manage other members.
    Admin,
    /// Regular member.
    Member,
}

impl FamilyRole {
    /// Wire representation used by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family metadata as shown to its members.
///
/// Never fetched on its own; derived from the session context with
/// [`Family::from_context`](crate::domain::Family::from_context). The
/// expenses dashboard embeds the same shape, `created_at` included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Family {
    /// Family identifier.
    pub id: FamilyId,
    /// Display name.
    pub name: String,
    /// Code other identities use to join.
    pub join_code: Option<String>,
    /// Optional monthly spending cap.
    pub monthly_spending_limit: Option<Decimal>,
    /// Creation time; the session context does not carry it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Public profile attached to a family member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    /// Profile identifier, equal to the member's user id.
    pub id: UserId,
    /// Display username.
    pub username: String,
    /// Avatar reference, if any.
    pub avatar_url: Option<String>,
}

/// One entry in the caller's family member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMember {
    /// Member's user id.
    pub user_id: UserId,
    /// Member's role.
    pub role: FamilyRole,
    /// When the member joined.
    pub joined_at: DateTime<Utc>,
    /// Public profile.
    pub profile: MemberProfile,
}

/// Validated family name: trimmed, non-empty, at most [`NAME_MAX`] characters.
///
/// # Examples
/// ```
/// use famspend::domain::FamilyName;
///
/// let name = FamilyName::new("  Smiths ").expect("valid name");
/// assert_eq!(name.as_ref(), "Smiths");
/// assert!(FamilyName::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyName(String);

impl FamilyName {
    /// Validate and construct a family name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, FamilyValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FamilyValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(FamilyValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FamilyName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Validated join code: trimmed, non-empty, without inner whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCode(String);

impl JoinCode {
    /// Validate and construct a join code.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, FamilyValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FamilyValidationError::EmptyJoinCode);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(FamilyValidationError::JoinCodeContainsWhitespace);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for JoinCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Non-negative monthly spending limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingLimit(Decimal);

impl SpendingLimit {
    /// Validate and construct a spending limit.
    pub fn new(amount: Decimal) -> Result<Self, FamilyValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(FamilyValidationError::NegativeSpendingLimit);
        }
        Ok(Self(amount))
    }

    /// The limit amount.
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

/// Input for creating a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFamily {
    /// Family name.
    pub name: FamilyName,
    /// Optional limit applied with a follow-up update after creation.
    pub monthly_spending_limit: Option<SpendingLimit>,
}

/// Input for updating the caller's family.
///
/// Fields left `None` are sent as `null`; the backend keeps the current name
/// for a `null` name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilyUpdate {
    /// New family name.
    pub name: Option<FamilyName>,
    /// New monthly spending limit.
    pub monthly_spending_limit: Option<SpendingLimit>,
}

/// Guard for the destructive delete action.
pub struct DeleteConfirmation;

impl DeleteConfirmation {
    /// Require the typed confirmation to equal the family name exactly.
    ///
    /// # Examples
    /// ```
    /// use famspend::domain::{DeleteConfirmation, Family, FamilyId};
    ///
    /// let family = Family {
    ///     id: FamilyId::random(),
    ///     name: "Smiths".to_owned(),
    ///     join_code: None,
    ///     monthly_spending_limit: None,
    ///     created_at: None,
    /// };
    /// assert!(DeleteConfirmation::verify(&family, "Smiths").is_ok());
    /// assert!(DeleteConfirmation::verify(&family, "smiths").is_err());
    /// ```
    pub fn verify(family: &Family, typed: &str) -> Result<(), FamilyValidationError> {
        if typed == family.name {
            Ok(())
        } else {
            Err(FamilyValidationError::ConfirmationMismatch)
        }
    }
}

/// Management action an admin can offer for another member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    /// Make a member an admin.
    Promote,
    /// Make an admin a regular member.
    Demote,
    /// Remove the member from the family.
    Kick,
}

impl MemberAction {
    /// Actions that make sense for the given member.
    pub fn available_for(member: &FamilyMember) -> Vec<Self> {
        match member.role {
            FamilyRole::Member => vec![Self::Promote, Self::Kick],
            FamilyRole::Admin => vec![Self::Demote, Self::Kick],
        }
    }

    /// Role the action assigns, if it is a role change.
    pub const fn target_role(self) -> Option<FamilyRole> {
        match self {
            Self::Promote => Some(FamilyRole::Admin),
            Self::Demote => Some(FamilyRole::Member),
            Self::Kick => None,
        }
    }
}

/// Members the current user may act on: everyone except themself.
///
/// The backend remains the authority on whether an action is permitted;
/// this only keeps self-targeting out of the offered choices.
pub fn manageable_members<'a>(
    members: &'a [FamilyMember],
    current_user: &'a UserId,
) -> impl Iterator<Item = &'a FamilyMember> + 'a {
    members
        .iter()
        .filter(move |member| &member.user_id != current_user)
}
