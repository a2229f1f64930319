//! Hooks dispatchers use to reach the read models they invalidate.

use async_trait::async_trait;

use crate::domain::Family;

/// A read model that can reload itself from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Refetch: Send + Sync {
    /// Reload and replace the read model wholesale.
    async fn refetch(&self);
}

/// What the family dispatcher needs from the family read model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FamilyView: Send + Sync {
    /// Family currently held in local state.
    fn current_family(&self) -> Option<Family>;

    /// Reload the session context and member list.
    async fn refetch(&self);
}
