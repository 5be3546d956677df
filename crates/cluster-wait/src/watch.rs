//! Deadline-bounded condition watching.
//!
//! [`await_condition`] is the core primitive: consume a change-notification
//! stream for one target until a predicate over the latest snapshot holds or
//! a deadline fires, whichever comes first. The wait helpers below wrap it
//! with the fixed predicates the e2e scenarios assert on.

use std::time::Duration;

use futures::StreamExt;
use tracing::debug;

use crate::cluster_trait::ClusterState;
use crate::error::WaitError;
use crate::models::{ObservedState, WaitOutcome, WatchTarget};
use crate::predicates;

/// Wait until `predicate` holds for the latest observed state of `target`.
///
/// Subscribes to the target's kind/namespace scope and evaluates the
/// predicate against every notification that matches the target's identity.
/// The first `true` resolves the wait as [`WaitOutcome::Satisfied`] and drops
/// the subscription; if `timeout` elapses first the wait resolves as
/// [`WaitOutcome::TimedOut`]. A zero `timeout` checks the current state
/// exactly once without subscribing.
///
/// A target that never appears in the stream is indistinguishable from a
/// condition that never becomes true: both time out. Callers that need the
/// distinction should pre-check existence with
/// [`ClusterState::current`].
///
/// The stream ending early is a server-initiated disconnect and surfaces as
/// [`WaitError::ChannelClosed`], never as a timeout. Reconnecting is the
/// caller's responsibility.
pub async fn await_condition<C, P>(
    cluster: &C,
    target: &WatchTarget,
    predicate: P,
    timeout: Duration,
) -> Result<WaitOutcome, WaitError>
where
    C: ClusterState + ?Sized,
    P: Fn(&ObservedState) -> bool,
{
    if timeout.is_zero() {
        let satisfied = match cluster.current(target).await? {
            Some(state) => predicate(&state),
            None => false,
        };
        return Ok(if satisfied {
            WaitOutcome::Satisfied
        } else {
            WaitOutcome::TimedOut
        });
    }

    let mut stream = cluster.subscribe(target).await?;
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => {
                debug!(name = %target.name, ?timeout, "condition wait timed out");
                return Ok(WaitOutcome::TimedOut);
            }
            event = stream.next() => match event {
                Some(Ok((name, state))) => {
                    if name == target.name && predicate(&state) {
                        debug!(name = %target.name, "condition satisfied");
                        return Ok(WaitOutcome::Satisfied);
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Err(WaitError::ChannelClosed),
            },
        }
    }
}

/// Wait until `node` reports a non-zero allocatable count for `resource`.
pub async fn wait_resource_ready<C>(
    cluster: &C,
    node: &str,
    resource: &str,
    timeout: Duration,
) -> Result<(), WaitError>
where
    C: ClusterState + ?Sized,
{
    let target = WatchTarget::node(node);
    let outcome =
        await_condition(cluster, &target, predicates::resource_ready(resource), timeout).await?;
    into_unit(outcome, timeout)
}

/// Wait until `node` reports a zero allocatable count for `resource`.
///
/// A resource the node has never reported also counts as zero.
pub async fn wait_resource_empty<C>(
    cluster: &C,
    node: &str,
    resource: &str,
    timeout: Duration,
) -> Result<(), WaitError>
where
    C: ClusterState + ?Sized,
{
    let target = WatchTarget::node(node);
    let outcome =
        await_condition(cluster, &target, predicates::resource_empty(resource), timeout).await?;
    into_unit(outcome, timeout)
}

/// Wait until the daemon set has replicas available on every eligible node.
pub async fn wait_daemon_set_ready<C>(
    cluster: &C,
    daemon_set: &str,
    namespace: &str,
    timeout: Duration,
) -> Result<(), WaitError>
where
    C: ClusterState + ?Sized,
{
    let target = WatchTarget::daemon_set(daemon_set, namespace);
    let outcome =
        await_condition(cluster, &target, predicates::daemon_set_ready(), timeout).await?;
    into_unit(outcome, timeout)
}

/// Wait until the pod reports the given lifecycle phase.
pub async fn wait_pod_phase<C>(
    cluster: &C,
    pod: &str,
    namespace: &str,
    phase: &str,
    timeout: Duration,
) -> Result<(), WaitError>
where
    C: ClusterState + ?Sized,
{
    let target = WatchTarget::pod(pod, namespace);
    let outcome =
        await_condition(cluster, &target, predicates::pod_in_phase(phase), timeout).await?;
    into_unit(outcome, timeout)
}

fn into_unit(outcome: WaitOutcome, timeout: Duration) -> Result<(), WaitError> {
    match outcome {
        WaitOutcome::Satisfied => Ok(()),
        WaitOutcome::TimedOut => Err(WaitError::TimedOut(timeout)),
    }
}
