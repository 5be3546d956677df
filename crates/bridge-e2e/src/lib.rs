//! End-to-end test harness for the network bridge device plugin.
//!
//! The plugin publishes host bridges as allocatable node resources and
//! attaches a bridge interface to every pod that requests one. The harness
//! drives a live cluster through that lifecycle: deploy the plugin, watch
//! resources appear, schedule consumers, wire up the host network, and check
//! connectivity between pods on different nodes.
//!
//! The waiting primitives live in the `cluster-wait` crate; this crate holds
//! the scenario-specific pieces — typed fixtures, namespace lifecycle,
//! interface discovery inside consumer pods, and the node command runner.
//! The scenarios themselves are under `tests/` and are `#[ignore]`d since
//! they need a real cluster.

pub mod error;
pub mod host;
pub mod manifests;
pub mod namespace;
pub mod network;
pub mod pods;

pub use error::HarnessError;
pub use host::NodeRunner;
pub use namespace::TestNamespace;
