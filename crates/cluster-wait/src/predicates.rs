//! Ready-made predicates over observed cluster state.
//!
//! Each constructor returns a pure closure suitable for
//! [`await_condition`](crate::await_condition). A predicate only ever matches
//! the state variant it is written for; any other variant is `false`.

use crate::models::ObservedState;

/// The named allocatable resource is reported with a non-zero count.
///
/// A missing entry counts as zero: resources the node has never reported are
/// not ready. Quantities are compared as the kubelet reports them, so a
/// count is "non-zero" exactly when the reported string is not `"0"`.
pub fn resource_ready(resource: impl Into<String>) -> impl Fn(&ObservedState) -> bool {
    let resource = resource.into();
    move |state| match state {
        ObservedState::Node { allocatable } => allocatable
            .get(&resource)
            .map_or("0", |quantity| quantity.0.as_str())
            != "0",
        _ => false,
    }
}

/// The named allocatable resource is reported with a zero count.
///
/// Missing entries count as zero, so this also matches nodes where the
/// resource is reported but nothing is allocatable yet.
pub fn resource_empty(resource: impl Into<String>) -> impl Fn(&ObservedState) -> bool {
    let resource = resource.into();
    move |state| match state {
        ObservedState::Node { allocatable } => allocatable
            .get(&resource)
            .map_or("0", |quantity| quantity.0.as_str())
            == "0",
        _ => false,
    }
}

/// The daemon set has no unavailable replicas and at least one available.
pub fn daemon_set_ready() -> impl Fn(&ObservedState) -> bool {
    |state| match state {
        ObservedState::DaemonSet {
            number_available,
            number_unavailable,
        } => *number_unavailable == 0 && *number_available > 0,
        _ => false,
    }
}

/// The pod reports the given lifecycle phase.
pub fn pod_in_phase(phase: impl Into<String>) -> impl Fn(&ObservedState) -> bool {
    let phase = phase.into();
    move |state| match state {
        ObservedState::Pod { phase: reported } => reported.as_deref() == Some(phase.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn node_with(resource: &str, count: &str) -> ObservedState {
        let mut allocatable = BTreeMap::new();
        allocatable.insert(resource.to_string(), Quantity(count.to_string()));
        ObservedState::Node { allocatable }
    }

    #[test]
    fn ready_and_empty_are_mutually_exclusive() {
        let resource = "bridge.network.kubevirt.io/mybr1";
        for state in [
            node_with(resource, "0"),
            node_with(resource, "2"),
            ObservedState::Node {
                allocatable: BTreeMap::new(),
            },
        ] {
            let ready = resource_ready(resource)(&state);
            let empty = resource_empty(resource)(&state);
            assert_ne!(ready, empty, "exactly one must hold for {state:?}");
        }
    }

    #[test]
    fn missing_resource_counts_as_zero() {
        let state = ObservedState::Node {
            allocatable: BTreeMap::new(),
        };
        assert!(resource_empty("bridge.network.kubevirt.io/mybr1")(&state));
        assert!(!resource_ready("bridge.network.kubevirt.io/mybr1")(&state));
    }

    #[test]
    fn ready_requires_nonzero_count() {
        assert!(resource_ready("r")(&node_with("r", "1")));
        assert!(!resource_ready("r")(&node_with("r", "0")));
    }

    #[test]
    fn node_predicates_ignore_other_state_kinds() {
        let state = ObservedState::Pod {
            phase: Some("Running".to_string()),
        };
        assert!(!resource_ready("r")(&state));
        assert!(!resource_empty("r")(&state));
    }

    #[test]
    fn daemon_set_ready_needs_available_and_no_unavailable() {
        let ready = daemon_set_ready();
        assert!(ready(&ObservedState::DaemonSet {
            number_available: 2,
            number_unavailable: 0
        }));
        assert!(!ready(&ObservedState::DaemonSet {
            number_available: 2,
            number_unavailable: 1
        }));
        assert!(!ready(&ObservedState::DaemonSet {
            number_available: 0,
            number_unavailable: 0
        }));
    }

    #[test]
    fn pod_phase_matches_exactly() {
        let pending = pod_in_phase("Pending");
        assert!(pending(&ObservedState::Pod {
            phase: Some("Pending".to_string())
        }));
        assert!(!pending(&ObservedState::Pod {
            phase: Some("Running".to_string())
        }));
        assert!(!pending(&ObservedState::Pod { phase: None }));
    }
}
