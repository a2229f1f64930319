//! Expenses dashboard read model and expense action dispatcher.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::in_flight::InFlight;
use super::lifecycle::Lifecycle;
use super::ports::{Procedure, Refetch, RpcError};
use super::{ActionError, ActionReporter, BackendProcedures, ExpenseId, ExpensesDashboard};

/// Dashboard read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    /// Last successfully fetched dashboard.
    pub data: Option<ExpensesDashboard>,
    /// Whether a fetch is running or has not yet run.
    pub loading: bool,
    /// Failure of the most recent fetch.
    pub error: Option<RpcError>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

/// Owns the expenses dashboard aggregate.
pub struct DashboardStore {
    procedures: BackendProcedures,
    state: watch::Sender<DashboardState>,
    lifecycle: Lifecycle,
}

impl DashboardStore {
    /// Build an empty store.
    pub fn new(procedures: BackendProcedures) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            procedures,
            state,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Observe wholesale replacements.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Fetch and replace the dashboard.
    pub async fn load(&self) {
        let ticket = self.lifecycle.begin();
        self.state.send_modify(|state| state.loading = true);

        let result = self.procedures.expenses_dashboard().await;

        if !self.lifecycle.is_current(ticket) {
            debug!("dropping stale expenses dashboard");
            return;
        }
        self.state.send_modify(|state| {
            match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                }
                Err(error) => {
                    warn!(
                        procedure = %Procedure::GetExpensesDashboardContext,
                        error = %error,
                        "failed to load expenses dashboard"
                    );
                    state.error = Some(error);
                }
            }
            state.loading = false;
        });
    }

    /// Stop committing results.
    pub fn dispose(&self) {
        self.lifecycle.dispose();
    }
}

#[async_trait]
impl Refetch for DashboardStore {
    async fn refetch(&self) {
        self.load().await;
    }
}

/// Dispatches expense mutations.
pub struct ExpenseActions {
    procedures: BackendProcedures,
    reporter: ActionReporter,
    deleting: InFlight,
    last_error: watch::Sender<Option<RpcError>>,
}

impl ExpenseActions {
    /// Build a dispatcher reporting through `reporter`.
    pub fn new(procedures: BackendProcedures, reporter: ActionReporter) -> Self {
        let (last_error, _) = watch::channel(None);
        Self {
            procedures,
            reporter,
            deleting: InFlight::default(),
            last_error,
        }
    }

    /// Delete one of the caller's expenses.
    pub async fn delete_expense(&self, expense_id: &ExpenseId) -> Result<(), ActionError> {
        let _deleting = self.deleting.start();
        let result = self
            .reporter
            .run(
                "delete_expense",
                "Expense deleted",
                "Failed to delete expense",
                self.procedures.delete_expense(expense_id),
            )
            .await;
        if let Err(ActionError::Backend(error)) = &result {
            self.last_error.send_replace(Some(error.clone()));
        }
        result
    }

    /// Whether a delete is running.
    pub fn is_deleting(&self) -> bool {
        self.deleting.is_set()
    }

    /// Failure of the most recent delete that failed.
    pub fn last_error(&self) -> Option<RpcError> {
        self.last_error.borrow().clone()
    }
}
