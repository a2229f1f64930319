//! Hand-written port doubles shared by the behaviour suites.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use famspend::domain::Identity;
use famspend::domain::ports::{
    AuthEvent, AuthProvider, AuthProviderError, Notifier, Procedure, RpcError, RpcGateway,
};
use serde_json::Value;
use tokio::sync::broadcast;

/// Gateway answering each procedure from a per-procedure script.
///
/// Calls are recorded in order. A procedure without a scripted answer fails
/// with a decode error naming it.
#[derive(Default)]
pub struct ScriptedGateway {
    answers: Mutex<HashMap<Procedure, VecDeque<Result<Value, RpcError>>>>,
    sticky: Mutex<HashMap<Procedure, Result<Value, RpcError>>>,
    calls: Mutex<Vec<(Procedure, Value)>>,
}

impl ScriptedGateway {
    /// Queue one answer for `procedure`.
    pub fn answer_once(&self, procedure: Procedure, answer: Result<Value, RpcError>) {
        self.answers
            .lock()
            .expect("answers mutex")
            .entry(procedure)
            .or_default()
            .push_back(answer);
    }

    /// Answer every unqueued call to `procedure` with `answer`.
    pub fn answer_always(&self, procedure: Procedure, answer: Result<Value, RpcError>) {
        self.sticky
            .lock()
            .expect("sticky mutex")
            .insert(procedure, answer);
    }

    pub fn calls(&self) -> Vec<(Procedure, Value)> {
        self.calls.lock().expect("calls mutex").clone()
    }

    pub fn procedures(&self) -> Vec<Procedure> {
        self.calls().into_iter().map(|(procedure, _)| procedure).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls mutex").clear();
    }
}

#[async_trait]
impl RpcGateway for ScriptedGateway {
    async fn call(&self, procedure: Procedure, args: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .expect("calls mutex")
            .push((procedure, args));
        let queued = self
            .answers
            .lock()
            .expect("answers mutex")
            .get_mut(&procedure)
            .and_then(VecDeque::pop_front);
        if let Some(answer) = queued {
            return answer;
        }
        self.sticky
            .lock()
            .expect("sticky mutex")
            .get(&procedure)
            .cloned()
            .unwrap_or_else(|| Err(RpcError::decode(format!("{procedure} was not scripted"))))
    }
}

/// Auth provider reporting a fixed identity.
pub struct StaticAuth {
    identity: Mutex<Option<Identity>>,
    events: broadcast::Sender<AuthEvent>,
}

impl StaticAuth {
    pub fn new(identity: Option<Identity>) -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            identity: Mutex::new(identity),
            events,
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthProviderError> {
        Ok(self.identity.lock().expect("identity mutex").clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// One emitted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.0.lock().expect("notifications mutex").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.0
            .lock()
            .expect("notifications mutex")
            .push(Notification::Success(message.to_owned()));
    }

    fn failure(&self, message: &str) {
        self.0
            .lock()
            .expect("notifications mutex")
            .push(Notification::Failure(message.to_owned()));
    }
}
