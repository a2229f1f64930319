//! Family action dispatcher.
//!
//! Every action defers permission checks to the backend procedure it calls.
//! Local state is never patched; a successful action refetches the family
//! read model instead.

use std::sync::Arc;

use async_trait::async_trait;

use super::ports::{FamilyView, Notifier, Refetch, RpcError};
use super::{
    ActionError, ActionReporter, BackendProcedures, FamilyId, FamilyRole, FamilyUpdate, JoinCode,
    NewFamily, UserId,
};

/// Dispatches family mutations.
pub struct FamilyActions {
    procedures: BackendProcedures,
    family: Arc<dyn FamilyView>,
    reporter: ActionReporter,
}

struct FamilyRefetch(Arc<dyn FamilyView>);

#[async_trait]
impl Refetch for FamilyRefetch {
    async fn refetch(&self) {
        self.0.refetch().await;
    }
}

impl FamilyActions {
    /// Build a dispatcher that refetches `family` after each success.
    pub fn new(
        procedures: BackendProcedures,
        family: Arc<dyn FamilyView>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let reporter = ActionReporter::new(notifier)
            .with_on_success(Arc::new(FamilyRefetch(Arc::clone(&family))));
        Self {
            procedures,
            family,
            reporter,
        }
    }

    fn require_family(&self) -> Result<(), ActionError> {
        self.family
            .current_family()
            .map(drop)
            .ok_or(ActionError::NoFamily)
    }

    /// Create a family, then apply its spending limit when one is given.
    ///
    /// A failing limit update reports the whole creation as failed; the
    /// family itself is not rolled back.
    pub async fn create_family(&self, new_family: &NewFamily) -> Result<FamilyId, ActionError> {
        self.reporter
            .run(
                "create_family",
                "Family created successfully!",
                "Failed to create family",
                async {
                    let family_id = self.procedures.create_family(&new_family.name).await?;
                    if let Some(limit) = new_family.monthly_spending_limit {
                        let update = FamilyUpdate {
                            name: None,
                            monthly_spending_limit: Some(limit),
                        };
                        self.procedures.update_family(&update).await?;
                    }
                    Ok::<_, RpcError>(family_id)
                },
            )
            .await
    }

    /// Join the family owning `code`.
    pub async fn join_family(&self, code: &JoinCode) -> Result<FamilyId, ActionError> {
        self.reporter
            .run(
                "join_family",
                "Successfully joined the family!",
                "Failed to join family",
                self.procedures.join_family(code),
            )
            .await
    }

    /// Update the caller's family.
    pub async fn update_family(&self, update: &FamilyUpdate) -> Result<(), ActionError> {
        self.require_family()?;
        self.reporter
            .run(
                "update_family",
                "Family updated successfully!",
                "Failed to update family",
                self.procedures.update_family(update),
            )
            .await
    }

    /// Delete the caller's family.
    ///
    /// Callers confirm first with
    /// [`DeleteConfirmation`](crate::domain::DeleteConfirmation).
    pub async fn delete_family(&self) -> Result<(), ActionError> {
        self.require_family()?;
        self.reporter
            .run(
                "delete_family",
                "Family deleted successfully!",
                "Failed to delete family",
                self.procedures.delete_family(),
            )
            .await
    }

    /// Leave the caller's family.
    pub async fn leave_family(&self) -> Result<(), ActionError> {
        self.reporter
            .run(
                "leave_family",
                "You have left the family",
                "Failed to leave family",
                self.procedures.leave_family(),
            )
            .await
    }

    /// Remove `target` from the family.
    pub async fn kick_member(&self, target: &UserId) -> Result<(), ActionError> {
        self.reporter
            .run(
                "kick_member",
                "Member removed successfully",
                "Failed to remove member",
                self.procedures.kick_member(target),
            )
            .await
    }

    /// Change `target`'s role.
    ///
    /// Self-targeting is not rejected here; callers offer only
    /// [`manageable_members`](crate::domain::manageable_members).
    pub async fn change_member_role(
        &self,
        target: &UserId,
        role: FamilyRole,
    ) -> Result<(), ActionError> {
        let success = format!("Member role updated to {role}");
        self.reporter
            .run(
                "change_member_role",
                &success,
                "Failed to update role",
                self.procedures.update_member_role(target, role),
            )
            .await
    }

    /// Issue a new join code; fails fast without a family.
    pub async fn regenerate_join_code(&self) -> Result<String, ActionError> {
        self.require_family()?;
        self.reporter
            .run(
                "regenerate_join_code",
                "Join code regenerated!",
                "Failed to regenerate code",
                self.procedures.regenerate_join_code(),
            )
            .await
    }
}
