//! Category read model and category action dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::in_flight::InFlight;
use super::lifecycle::Lifecycle;
use super::ports::{Notifier, Procedure, Refetch, RpcError};
use super::{ActionError, ActionReporter, BackendProcedures, Category, CategoryId, CategoryName};

const LOAD_FAILURE: &str = "Failed to load categories";

/// Category list read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriesState {
    /// Last successfully fetched categories.
    pub categories: Vec<Category>,
    /// Whether a fetch is running or has not yet run.
    pub loading: bool,
    /// Failure of the most recent fetch.
    pub error: Option<RpcError>,
}

impl Default for CategoriesState {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// Owns the caller's family category list.
pub struct CategoryStore {
    procedures: BackendProcedures,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<CategoriesState>,
    lifecycle: Lifecycle,
}

impl CategoryStore {
    /// Build an empty store.
    pub fn new(procedures: BackendProcedures, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CategoriesState::default());
        Self {
            procedures,
            notifier,
            state,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> CategoriesState {
        self.state.borrow().clone()
    }

    /// Observe wholesale replacements.
    pub fn subscribe(&self) -> watch::Receiver<CategoriesState> {
        self.state.subscribe()
    }

    /// Fetch and replace the category list.
    ///
    /// A failure keeps the previous list and shows a notification.
    pub async fn load(&self) {
        let ticket = self.lifecycle.begin();
        self.state.send_modify(|state| state.loading = true);

        let result = self.procedures.categories().await;

        if !self.lifecycle.is_current(ticket) {
            debug!("dropping stale category list");
            return;
        }
        match result {
            Ok(categories) => self.state.send_modify(|state| {
                state.categories = categories;
                state.error = None;
                state.loading = false;
            }),
            Err(error) => {
                warn!(
                    procedure = %Procedure::GetCategoriesForMyFamily,
                    error = %error,
                    "failed to load categories"
                );
                self.notifier.failure(LOAD_FAILURE);
                self.state.send_modify(|state| {
                    state.error = Some(error);
                    state.loading = false;
                });
            }
        }
    }

    /// Stop committing results.
    pub fn dispose(&self) {
        self.lifecycle.dispose();
    }
}

#[async_trait]
impl Refetch for CategoryStore {
    async fn refetch(&self) {
        self.load().await;
    }
}

/// Dispatches category mutations.
pub struct CategoryActions {
    procedures: BackendProcedures,
    reporter: ActionReporter,
    creating: InFlight,
    deleting: InFlight,
}

impl CategoryActions {
    /// Build a dispatcher reporting through `reporter`.
    pub fn new(procedures: BackendProcedures, reporter: ActionReporter) -> Self {
        Self {
            procedures,
            reporter,
            creating: InFlight::default(),
            deleting: InFlight::default(),
        }
    }

    /// Create a category in the caller's family.
    pub async fn create(&self, name: &CategoryName) -> Result<Category, ActionError> {
        let _creating = self.creating.start();
        self.reporter
            .run(
                "create_category",
                "Category created",
                "Failed to create category",
                self.procedures.create_category(name),
            )
            .await
    }

    /// Delete a category from the caller's family.
    pub async fn remove(&self, category_id: &CategoryId) -> Result<(), ActionError> {
        let _deleting = self.deleting.start();
        self.reporter
            .run(
                "delete_category",
                "Category deleted",
                "Failed to delete category",
                self.procedures.delete_category(category_id),
            )
            .await
    }

    /// Whether a create is running.
    pub fn is_creating(&self) -> bool {
        self.creating.is_set()
    }

    /// Whether a delete is running.
    pub fn is_deleting(&self) -> bool {
        self.deleting.is_set()
    }
}
