//! Collaborator traits for condition watching.
//!
//! These traits abstract the cluster so waits can be exercised against a mock
//! in unit tests. The concrete [`KubeCluster`](crate::KubeCluster) implements
//! all three against a live API server.

use std::pin::Pin;

use futures::Stream;

use crate::error::WaitError;
use crate::models::{ObservedState, WatchTarget};

/// A single change notification: the resource name it concerns and the
/// snapshot that replaces any previously observed state.
pub type WatchEvent = (String, ObservedState);

/// Unbounded sequence of change notifications, in arrival order.
///
/// A stream is scoped to a resource kind and namespace, so it may carry
/// events for resources other than the one a wait targets; identity
/// filtering is the watcher's job.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<WatchEvent, WaitError>> + Send>>;

/// Source of cluster state: change subscriptions plus one-shot reads.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterState: Send + Sync {
    /// Subscribe to change notifications for the target's kind and namespace.
    ///
    /// The returned stream carries events for every resource of that scope;
    /// it ends only when the server closes the watch. Dropping the stream
    /// cancels the subscription.
    async fn subscribe(&self, target: &WatchTarget) -> Result<EventStream, WaitError>;

    /// Read the current state of the target, or `None` if it does not exist.
    async fn current(&self, target: &WatchTarget) -> Result<Option<ObservedState>, WaitError>;
}

/// Runs a command inside a pod and captures its output.
#[async_trait::async_trait]
pub trait RemoteExec: Send + Sync {
    /// Run `command` through a shell in the pod's first container and return
    /// captured stdout. Non-zero exit and transport failures both surface as
    /// [`WaitError::RemoteCommandFailed`].
    async fn run(&self, pod: &str, namespace: &str, command: &str) -> Result<String, WaitError>;
}

/// Retrieves the current log output of a pod.
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the pod's current log text.
    async fn logs(&self, pod: &str, namespace: &str) -> Result<String, WaitError>;
}
