//! Wire rows returned by backend procedures.
//!
//! Procedures answer with flat, nullable columns. These rows are decoded first
//! and then mapped into domain records in one pass.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    ContextValidationError, FamilyId, FamilyMember, FamilyRole, MemberProfile, Membership,
    UserContext, UserId,
};

#[derive(Debug, Deserialize)]
pub(super) struct ContextRow {
    pub(super) user_id: UserId,
    #[serde(default)]
    pub(super) username: Option<String>,
    #[serde(default)]
    pub(super) avatar_url: Option<String>,
    #[serde(default)]
    pub(super) family_id: Option<FamilyId>,
    #[serde(default)]
    pub(super) role: Option<FamilyRole>,
    #[serde(default)]
    pub(super) family_name: Option<String>,
    #[serde(default)]
    pub(super) join_code: Option<String>,
    #[serde(default)]
    pub(super) monthly_spending_limit: Option<Decimal>,
}

impl ContextRow {
    pub(super) fn into_domain(self) -> Result<UserContext, ContextValidationError> {
        let membership = Membership::from_columns(
            self.family_id,
            self.role,
            self.family_name,
            self.join_code,
            self.monthly_spending_limit,
        )?;
        Ok(UserContext::new(
            self.user_id,
            self.username.unwrap_or_default(),
            self.avatar_url,
            membership,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MemberRow {
    pub(super) user_id: UserId,
    pub(super) role: FamilyRole,
    pub(super) joined_at: DateTime<Utc>,
    #[serde(default)]
    pub(super) username: Option<String>,
    #[serde(default)]
    pub(super) avatar_url: Option<String>,
}

impl MemberRow {
    pub(super) fn into_domain(self) -> FamilyMember {
        FamilyMember {
            user_id: self.user_id.clone(),
            role: self.role,
            joined_at: self.joined_at,
            profile: MemberProfile {
                id: self.user_id,
                username: self.username.unwrap_or_default(),
                avatar_url: self.avatar_url,
            },
        }
    }
}
