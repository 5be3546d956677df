//! Condition watching against live Kubernetes cluster state.
//!
//! End-to-end tests spend most of their time waiting: for a daemon set to
//! roll out, for a node to report an allocatable resource, for a pod to reach
//! a phase. This crate packages that waiting as a small library — a
//! deadline-bounded watch loop over change notifications, a fixed-interval
//! retry loop for pull-only sources (logs, exec availability), and the
//! predicates the scenarios assert with.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cluster_wait::{KubeCluster, wait_daemon_set_ready, wait_resource_ready};
//!
//! # async fn example() -> Result<(), cluster_wait::WaitError> {
//! let cluster = KubeCluster::try_default().await?;
//!
//! // Block until the plugin daemon set has rolled out everywhere.
//! wait_daemon_set_ready(&cluster, "bridge-device-plugin", "e2e", Duration::from_secs(300))
//!     .await?;
//!
//! // Then until the node starts reporting the bridge as allocatable.
//! wait_resource_ready(
//!     &cluster,
//!     "node01",
//!     "bridge.network.kubevirt.io/mybr1",
//!     Duration::from_secs(60),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Watch waits**: [`await_condition`] with caller-supplied predicates,
//!   plus helpers for the common node/daemon-set/pod conditions
//! - **Retry waits**: [`retry`], [`await_in_logs`], [`await_exec_ready`] for
//!   sources without a notification channel
//! - **Trait seams**: [`ClusterState`], [`RemoteExec`], [`LogSource`] so
//!   waits are testable without a cluster (`test-util` feature)

pub mod client;
pub mod error;
pub mod models;
pub mod predicates;
pub mod retry;
pub mod watch;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeCluster;
pub use cluster_trait::{ClusterState, EventStream, LogSource, RemoteExec, WatchEvent};
pub use error::WaitError;
pub use models::{ObservedState, ResourceKind, WaitOutcome, WatchTarget};
pub use retry::{RETRY_INTERVAL, await_exec_ready, await_in_logs, retry};
pub use watch::{
    await_condition, wait_daemon_set_ready, wait_pod_phase, wait_resource_empty,
    wait_resource_ready,
};
#[cfg(feature = "test-util")]
pub use mock::{MockCluster, MockExec, MockLogs};
