//! Mock collaborators for unit testing.
//!
//! [`MockCluster`] stands in for a live API server: tests seed current state,
//! push change notifications, and inject disconnects without any network.
//! [`MockExec`] and [`MockLogs`] script outcomes for the retry-based waits.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::cluster_trait::{ClusterState, EventStream, LogSource, RemoteExec, WatchEvent};
use crate::error::WaitError;
use crate::models::{ObservedState, ResourceKind, WatchTarget};

type StateKey = (ResourceKind, Option<String>, String);
type ScopeKey = (ResourceKind, Option<String>);
type Subscriber = (ScopeKey, mpsc::UnboundedSender<Result<WatchEvent, WaitError>>);

/// Mock cluster for testing.
///
/// Subscriptions replay the matching current state first, like the initial
/// list of a real watch, then receive whatever the test pushes.
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<HashMap<StateKey, ObservedState>>>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl std::fmt::Debug for MockCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCluster").finish_non_exhaustive()
    }
}

impl MockCluster {
    /// Create an empty mock cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the current state of a target without notifying subscribers.
    pub fn set_state(&self, target: &WatchTarget, state: ObservedState) {
        self.state
            .lock()
            .unwrap()
            .insert(state_key(target), state);
    }

    /// Record a state change and deliver it to matching subscriptions.
    pub fn push_event(&self, target: &WatchTarget, state: ObservedState) {
        self.set_state(target, state.clone());

        let scope = scope_key(target);
        let subscribers = self.subscribers.lock().unwrap();
        for (subscriber_scope, sender) in subscribers.iter() {
            if *subscriber_scope == scope {
                let _ = sender.send(Ok((target.name.clone(), state.clone())));
            }
        }
    }

    /// Drop every open subscription, simulating a server-initiated disconnect.
    pub fn close_streams(&self) {
        self.subscribers.lock().unwrap().clear();
    }

    /// Number of currently open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ClusterState for MockCluster {
    async fn subscribe(&self, target: &WatchTarget) -> Result<EventStream, WaitError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scope = scope_key(target);

        for ((kind, namespace, name), state) in self.state.lock().unwrap().iter() {
            if (*kind, namespace.clone()) == scope {
                let _ = sender.send(Ok((name.clone(), state.clone())));
            }
        }

        self.subscribers.lock().unwrap().push((scope, sender));
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn current(&self, target: &WatchTarget) -> Result<Option<ObservedState>, WaitError> {
        Ok(self.state.lock().unwrap().get(&state_key(target)).cloned())
    }
}

fn state_key(target: &WatchTarget) -> StateKey {
    (target.kind, target.namespace.clone(), target.name.clone())
}

fn scope_key(target: &WatchTarget) -> ScopeKey {
    (target.kind, target.namespace.clone())
}

/// Scripted command executor.
///
/// Each call pops the next scripted outcome; an empty script succeeds with
/// empty output.
#[derive(Clone, Default)]
pub struct MockExec {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<u32>>,
}

impl std::fmt::Debug for MockExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockExec").finish_non_exhaustive()
    }
}

impl MockExec {
    /// Create an executor with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful run with the given stdout.
    pub fn push_ok(&self, stdout: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(stdout.to_string()));
    }

    /// Queue a failed run.
    pub fn push_err(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Number of runs so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl RemoteExec for MockExec {
    async fn run(&self, _pod: &str, _namespace: &str, _command: &str) -> Result<String, WaitError> {
        *self.calls.lock().unwrap() += 1;
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(stdout)) => Ok(stdout),
            Some(Err(message)) => Err(WaitError::RemoteCommandFailed(message)),
            None => Ok(String::new()),
        }
    }
}

/// Scripted log source.
///
/// Each fetch pops the next queued text; the final entry repeats so a pod's
/// logs keep their last contents once the script runs out.
#[derive(Clone, Default)]
pub struct MockLogs {
    script: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<u32>>,
}

impl std::fmt::Debug for MockLogs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLogs").finish_non_exhaustive()
    }
}

impl MockLogs {
    /// Create a log source with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the log text returned by the next fetch.
    pub fn push_text(&self, text: &str) {
        self.script.lock().unwrap().push_back(text.to_string());
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl LogSource for MockLogs {
    async fn logs(&self, _pod: &str, _namespace: &str) -> Result<String, WaitError> {
        *self.calls.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            Ok(script.pop_front().unwrap_or_default())
        } else {
            Ok(script.front().cloned().unwrap_or_default())
        }
    }
}
