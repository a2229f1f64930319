//! Driven port for invoking named backend procedures.
//!
//! The backend encapsulates all authorisation and persistence. The client
//! only knows procedure names, argument keys and result shapes; every permission
//! decision is left to the procedure itself.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;

/// Closed set of procedures the client invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    GetMyContext,
    GetCategoriesForMyFamily,
    CreateCategoryForMyFamily,
    DeleteCategoryForMyFamily,
    GetExpensesDashboardContext,
    DeleteMyExpense,
    CreateFamily,
    JoinFamily,
    LeaveFamily,
    UpdateFamily,
    DeleteFamily,
    RegenerateFamilyCode,
    GetFamilyMembers,
    KickMember,
    UpdateMemberRole,
}

impl Procedure {
    /// Every procedure, in table order.
    pub const ALL: [Self; 15] = [
        Self::GetMyContext,
        Self::GetCategoriesForMyFamily,
        Self::CreateCategoryForMyFamily,
        Self::DeleteCategoryForMyFamily,
        Self::GetExpensesDashboardContext,
        Self::DeleteMyExpense,
        Self::CreateFamily,
        Self::JoinFamily,
        Self::LeaveFamily,
        Self::UpdateFamily,
        Self::DeleteFamily,
        Self::RegenerateFamilyCode,
        Self::GetFamilyMembers,
        Self::KickMember,
        Self::UpdateMemberRole,
    ];

    /// Wire name of the procedure.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetMyContext => "get_my_context",
            Self::GetCategoriesForMyFamily => "get_categories_for_my_family",
            Self::CreateCategoryForMyFamily => "create_category_for_my_family",
            Self::DeleteCategoryForMyFamily => "delete_category_for_my_family",
            Self::GetExpensesDashboardContext => "get_expenses_dashboard_context",
            Self::DeleteMyExpense => "delete_my_expense",
            Self::CreateFamily => "create_family",
            Self::JoinFamily => "join_family",
            Self::LeaveFamily => "leave_family",
            Self::UpdateFamily => "update_family",
            Self::DeleteFamily => "delete_family",
            Self::RegenerateFamilyCode => "regenerate_family_code",
            Self::GetFamilyMembers => "get_family_members",
            Self::KickMember => "kick_member",
            Self::UpdateMemberRole => "update_member_role",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

define_port_error! {
    /// Errors surfaced while invoking a backend procedure.
    pub enum RpcError {
        /// Network transport failed or the backend failed internally.
        Transport { message: String } =>
            "backend transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "backend call timed out: {message}",
        /// The session credential was missing, expired or refused.
        Unauthenticated { message: String } =>
            "backend rejected the session: {message}",
        /// The procedure refused the call.
        Rejected { procedure: String, code: String, message: String } =>
            "{procedure} rejected the call: {message}",
        /// The result did not match the expected shape.
        Decode { message: String } =>
            "backend response decode failed: {message}",
    }
}

impl RpcError {
    /// Backend-provided rejection text, when present and not blank.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Port for invoking backend procedures by name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Invoke `procedure` with a JSON object of named arguments.
    ///
    /// Procedures without a result resolve to [`Value::Null`].
    async fn call(&self, procedure: Procedure, args: Value) -> Result<Value, RpcError>;
}

/// Fixture gateway that answers every call with `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRpcGateway;

#[async_trait]
impl RpcGateway for FixtureRpcGateway {
    async fn call(&self, _procedure: Procedure, _args: Value) -> Result<Value, RpcError> {
        Ok(Value::Null)
    }
}
