//! Data model for condition watching.
//!
//! A wait is described by a [`WatchTarget`] (what to observe), fed with
//! [`ObservedState`] snapshots (the latest relevant status of that resource),
//! and resolves to a [`WaitOutcome`].

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Kind of cluster resource a wait observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A cluster node and its allocatable resource counts.
    Node,
    /// A daemon set and its replica availability.
    DaemonSet,
    /// A pod and its lifecycle phase.
    Pod,
    /// The log output of a pod.
    PodLog,
}

/// Identifies the resource a single wait observes.
///
/// Immutable once a poll begins. Nodes are cluster-scoped, so their
/// `namespace` is `None`; the namespaced constructors always set it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Resource kind being observed.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Namespace, for namespaced kinds.
    pub namespace: Option<String>,
}

impl WatchTarget {
    /// Target a cluster node by name.
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Node,
            name: name.into(),
            namespace: None,
        }
    }

    /// Target a daemon set in a namespace.
    pub fn daemon_set(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::DaemonSet,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Target a pod in a namespace.
    pub fn pod(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Pod,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Target the log output of a pod in a namespace.
    pub fn pod_log(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::PodLog,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Namespace of the target, or `default` when none is set.
    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default)
    }
}

/// Latest snapshot of a resource's relevant status fields.
///
/// Replaced wholesale on each notification; no history is retained.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedState {
    /// Allocatable resource counts reported by a node.
    Node {
        /// Resource name to reported quantity, as published by the kubelet.
        allocatable: BTreeMap<String, Quantity>,
    },
    /// Replica availability reported by a daemon set.
    DaemonSet {
        /// Number of nodes running an available replica.
        number_available: i32,
        /// Number of nodes that should run a replica but have none available.
        number_unavailable: i32,
    },
    /// Lifecycle phase reported by a pod.
    Pod {
        /// Current phase, when the pod has one (`Pending`, `Running`, ...).
        phase: Option<String>,
    },
    /// Current log output of a pod.
    Log {
        /// Raw log text.
        text: String,
    },
}

/// How a wait resolved: the predicate became true, or the deadline fired.
///
/// `ChannelClosed` and other failures are errors, never an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The predicate returned true for an observed snapshot.
    Satisfied,
    /// The deadline elapsed before any snapshot satisfied the predicate.
    TimedOut,
}

impl WaitOutcome {
    /// True if the wait resolved with a satisfied predicate.
    pub fn is_satisfied(self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_targets_are_cluster_scoped() {
        let target = WatchTarget::node("node01");
        assert_eq!(target.kind, ResourceKind::Node);
        assert_eq!(target.namespace, None);
        assert_eq!(target.namespace_or("default"), "default");
    }

    #[test]
    fn namespaced_targets_keep_their_namespace() {
        let target = WatchTarget::daemon_set("bridge-device-plugin", "e2e");
        assert_eq!(target.namespace_or("default"), "e2e");

        let target = WatchTarget::pod_log("bridge-consumer-1", "e2e");
        assert_eq!(target.kind, ResourceKind::PodLog);
        assert_eq!(target.namespace.as_deref(), Some("e2e"));
    }
}
