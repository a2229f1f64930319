//! Error returned by action dispatchers.

use super::ports::RpcError;

/// Failure of one dispatched action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action needs a family in local state and there is none.
    ///
    /// Raised before any backend call; no notification is emitted.
    #[error("no family is loaded")]
    NoFamily,
    /// The backend refused or failed the call. A failure notification has
    /// already been emitted.
    #[error(transparent)]
    Backend(#[from] RpcError),
}
