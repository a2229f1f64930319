//! Typed facade over the backend procedure gateway.
//!
//! Owns argument encoding and result decoding for every procedure the client
//! invokes, so services never handle raw JSON.

mod rows;

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use self::rows::{ContextRow, MemberRow};
use super::ports::{Procedure, RpcError, RpcGateway};
use super::{
    Category, CategoryId, CategoryName, ExpenseId, ExpensesDashboard, FamilyId, FamilyMember,
    FamilyName, FamilyRole, FamilyUpdate, JoinCode, UserContext, UserId,
};

/// One typed method per backend procedure.
#[derive(Clone)]
pub struct BackendProcedures {
    gateway: Arc<dyn RpcGateway>,
}

impl BackendProcedures {
    /// Wrap a gateway.
    pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
        Self { gateway }
    }

    async fn invoke(&self, procedure: Procedure, args: Value) -> Result<Value, RpcError> {
        debug!(procedure = %procedure, "calling backend procedure");
        self.gateway.call(procedure, args).await
    }

    /// Canonical identity and membership context; `None` when no row exists.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Decode`] when the row breaks the role/family
    /// invariant.
    pub async fn my_context(&self) -> Result<Option<UserContext>, RpcError> {
        let procedure = Procedure::GetMyContext;
        let value = self.invoke(procedure, empty_args()).await?;
        let Some(row) = rows(value).into_iter().next() else {
            return Ok(None);
        };
        let row: ContextRow = decode(procedure, row)?;
        row.into_domain()
            .map(Some)
            .map_err(|error| RpcError::decode(format!("{procedure}: {error}")))
    }

    /// Categories of the caller's family.
    pub async fn categories(&self) -> Result<Vec<Category>, RpcError> {
        let procedure = Procedure::GetCategoriesForMyFamily;
        let value = self.invoke(procedure, empty_args()).await?;
        decode_rows(procedure, value)
    }

    /// Create a category in the caller's family.
    pub async fn create_category(&self, name: &CategoryName) -> Result<Category, RpcError> {
        let procedure = Procedure::CreateCategoryForMyFamily;
        let value = self
            .invoke(procedure, json!({ "category_name": name.as_ref() }))
            .await?;
        decode(procedure, single(value))
    }

    /// Delete a category from the caller's family.
    pub async fn delete_category(&self, category_id: &CategoryId) -> Result<(), RpcError> {
        self.invoke(
            Procedure::DeleteCategoryForMyFamily,
            json!({ "category_id": category_id }),
        )
        .await
        .map(drop)
    }

    /// Aggregate read backing the expenses page.
    pub async fn expenses_dashboard(&self) -> Result<ExpensesDashboard, RpcError> {
        let procedure = Procedure::GetExpensesDashboardContext;
        let value = self.invoke(procedure, empty_args()).await?;
        decode(procedure, single(value))
    }

    /// Delete one of the caller's expenses.
    pub async fn delete_expense(&self, expense_id: &ExpenseId) -> Result<(), RpcError> {
        self.invoke(Procedure::DeleteMyExpense, json!({ "expense_id": expense_id }))
            .await
            .map(drop)
    }

    /// Create a family with the caller as admin; returns the new family id.
    pub async fn create_family(&self, name: &FamilyName) -> Result<FamilyId, RpcError> {
        let procedure = Procedure::CreateFamily;
        let value = self
            .invoke(procedure, json!({ "family_name": name.as_ref() }))
            .await?;
        decode(procedure, single(value))
    }

    /// Join the family owning `code`; returns the joined family id.
    pub async fn join_family(&self, code: &JoinCode) -> Result<FamilyId, RpcError> {
        let procedure = Procedure::JoinFamily;
        let value = self
            .invoke(procedure, json!({ "input_join_code": code.as_ref() }))
            .await?;
        decode(procedure, single(value))
    }

    /// Leave the caller's family.
    pub async fn leave_family(&self) -> Result<(), RpcError> {
        self.invoke(Procedure::LeaveFamily, empty_args())
            .await
            .map(drop)
    }

    /// Update the caller's family. Both arguments are always sent.
    pub async fn update_family(&self, update: &FamilyUpdate) -> Result<(), RpcError> {
        let new_name = update.name.as_ref().map(AsRef::<str>::as_ref);
        let new_limit = match update.monthly_spending_limit {
            Some(limit) => Some(limit.amount().to_f64().ok_or_else(|| {
                RpcError::decode(format!(
                    "{}: spending limit {} is not representable",
                    Procedure::UpdateFamily,
                    limit.amount()
                ))
            })?),
            None => None,
        };
        self.invoke(
            Procedure::UpdateFamily,
            json!({ "new_name": new_name, "new_limit": new_limit }),
        )
        .await
        .map(drop)
    }

    /// Delete the caller's family.
    pub async fn delete_family(&self) -> Result<(), RpcError> {
        self.invoke(Procedure::DeleteFamily, empty_args())
            .await
            .map(drop)
    }

    /// Issue a new join code for the caller's family.
    pub async fn regenerate_join_code(&self) -> Result<String, RpcError> {
        let procedure = Procedure::RegenerateFamilyCode;
        let value = self.invoke(procedure, empty_args()).await?;
        decode(procedure, single(value))
    }

    /// Members of the caller's family with nested profiles.
    pub async fn family_members(&self) -> Result<Vec<FamilyMember>, RpcError> {
        let procedure = Procedure::GetFamilyMembers;
        let value = self.invoke(procedure, empty_args()).await?;
        let rows: Vec<MemberRow> = decode_rows(procedure, value)?;
        Ok(rows.into_iter().map(MemberRow::into_domain).collect())
    }

    /// Remove a member from the caller's family.
    pub async fn kick_member(&self, target: &UserId) -> Result<(), RpcError> {
        self.invoke(Procedure::KickMember, json!({ "target_user_id": target }))
            .await
            .map(drop)
    }

    /// Change a member's role.
    pub async fn update_member_role(
        &self,
        target: &UserId,
        role: FamilyRole,
    ) -> Result<(), RpcError> {
        self.invoke(
            Procedure::UpdateMemberRole,
            json!({ "target_user_id": target, "new_role": role }),
        )
        .await
        .map(drop)
    }
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Normalise a set-returning result into rows.
fn rows(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Unwrap a single-row array; other values pass through.
fn single(value: Value) -> Value {
    match value {
        Value::Array(items) if items.len() == 1 => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn decode<T: DeserializeOwned>(procedure: Procedure, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|error| RpcError::decode(format!("{procedure}: {error}")))
}

fn decode_rows<T: DeserializeOwned>(
    procedure: Procedure,
    value: Value,
) -> Result<Vec<T>, RpcError> {
    rows(value)
        .into_iter()
        .map(|row| decode(procedure, row))
        .collect()
}
