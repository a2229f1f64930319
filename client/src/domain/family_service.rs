//! Family state aggregator.
//!
//! Composes the session context with a separately fetched member list into
//! one read model: the derived `family`, its `members`, and `is_admin`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::lifecycle::{Lifecycle, LoadTicket};
use super::ports::{FamilyView, Procedure, Refetch, RpcError};
use super::{BackendProcedures, Family, FamilyId, FamilyMember, SessionResolver, UserContext};

/// Member-list read model owned by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersState {
    /// Last successfully fetched member list.
    pub members: Vec<FamilyMember>,
    /// Whether a member fetch is running or has not yet run.
    pub loading: bool,
    /// Failure of the most recent member fetch.
    pub error: Option<RpcError>,
}

impl Default for MembersState {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// Aggregated family read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyState {
    /// Family derived from the session context.
    pub family: Option<Family>,
    /// Members of that family.
    pub members: Vec<FamilyMember>,
    /// Whether the caller administers the family.
    pub is_admin: bool,
    /// Whether the session or the member list is loading.
    pub loading: bool,
    /// Failure of the most recent member fetch.
    pub error: Option<RpcError>,
}

/// Keeps the member list in step with the session's family scope.
pub struct FamilyStore {
    session: Arc<SessionResolver>,
    procedures: BackendProcedures,
    members: watch::Sender<MembersState>,
    lifecycle: Lifecycle,
    // Family scope of the last member fetch; `None` before the first one.
    fetched_scope: Mutex<Option<Option<FamilyId>>>,
}

impl FamilyStore {
    /// Build an aggregator on top of `session`.
    pub fn new(session: Arc<SessionResolver>, procedures: BackendProcedures) -> Self {
        let (members, _) = watch::channel(MembersState::default());
        Self {
            session,
            procedures,
            members,
            lifecycle: Lifecycle::default(),
            fetched_scope: Mutex::new(None),
        }
    }

    /// Session the aggregator is built on.
    pub fn session(&self) -> &Arc<SessionResolver> {
        &self.session
    }

    /// Current aggregated state.
    pub fn snapshot(&self) -> FamilyState {
        let session = self.session.snapshot();
        let members = self.members.borrow().clone();
        let context = session.context.as_ref();
        FamilyState {
            family: context.and_then(Family::from_context),
            is_admin: context.is_some_and(UserContext::is_admin),
            members: members.members,
            loading: session.loading || members.loading,
            error: members.error,
        }
    }

    /// Observe wholesale replacements of the member list.
    pub fn subscribe_members(&self) -> watch::Receiver<MembersState> {
        self.members.subscribe()
    }

    /// Fetch members if the family scope changed since the last fetch.
    ///
    /// Waits for the session to finish loading first.
    pub async fn load(&self) {
        self.session.wait_until_loaded().await;
        let mut fetched_scope = self.fetched_scope.lock().await;
        let family_id = self.current_family_id();
        if fetched_scope.as_ref() == Some(&family_id) {
            return;
        }
        self.fetch_members_locked(&mut fetched_scope).await;
    }

    /// Re-run the member fetch for the current scope.
    pub async fn fetch_members(&self) {
        let mut fetched_scope = self.fetched_scope.lock().await;
        self.fetch_members_locked(&mut fetched_scope).await;
    }

    /// Refresh the session, then re-run the member fetch.
    ///
    /// The member fetch sees the refreshed family scope.
    pub async fn refetch(&self) {
        let mut fetched_scope = self.fetched_scope.lock().await;
        self.session.refresh().await;
        self.fetch_members_locked(&mut fetched_scope).await;
    }

    /// Load members whenever the session state changes.
    ///
    /// The task ends when the store is disposed or the session is dropped.
    pub fn follow_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.session.subscribe();
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = store.lifecycle.disposed() => break,
                    () = store.load() => {}
                }
                let changed = tokio::select! {
                    biased;
                    () = store.lifecycle.disposed() => break,
                    changed = changes.changed() => changed,
                };
                if changed.is_err() {
                    break;
                }
            }
            debug!("session follower stopped");
        })
    }

    /// Stop committing results.
    pub fn dispose(&self) {
        self.lifecycle.dispose();
    }

    fn current_family_id(&self) -> Option<FamilyId> {
        self.session
            .snapshot()
            .context
            .and_then(|context| context.family_id().cloned())
    }

    async fn fetch_members_locked(&self, fetched_scope: &mut Option<Option<FamilyId>>) {
        self.session.wait_until_loaded().await;
        let family_id = self.current_family_id();
        *fetched_scope = Some(family_id.clone());
        let ticket = self.lifecycle.begin();

        if family_id.is_none() {
            self.commit(ticket, |state| {
                state.members.clear();
                state.error = None;
                state.loading = false;
            });
            return;
        }

        if !self.commit(ticket, |state| {
            state.loading = true;
            state.error = None;
        }) {
            return;
        }

        let result = self.procedures.family_members().await;
        self.commit(ticket, |state| {
            match result {
                Ok(members) => state.members = members,
                Err(error) => {
                    warn!(
                        procedure = %Procedure::GetFamilyMembers,
                        error = %error,
                        "failed to load family members"
                    );
                    state.error = Some(error);
                }
            }
            state.loading = false;
        });
    }

    fn commit(&self, ticket: LoadTicket, apply: impl FnOnce(&mut MembersState)) -> bool {
        if !self.lifecycle.is_current(ticket) {
            debug!("dropping stale member list update");
            return false;
        }
        self.members.send_modify(apply);
        true
    }
}

#[async_trait]
impl Refetch for FamilyStore {
    async fn refetch(&self) {
        FamilyStore::refetch(self).await;
    }
}

#[async_trait]
impl FamilyView for FamilyStore {
    fn current_family(&self) -> Option<Family> {
        self.snapshot().family
    }

    async fn refetch(&self) {
        FamilyStore::refetch(self).await;
    }
}
