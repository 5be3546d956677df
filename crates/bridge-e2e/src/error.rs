//! Harness-specific error types.

use thiserror::Error;

/// Errors that can occur while driving the e2e scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// A condition or retry wait failed
    #[error(transparent)]
    Wait(#[from] cluster_wait::WaitError),

    /// A command run on a cluster node failed
    #[error("command on node {node} exited with {code:?}: {stderr}")]
    NodeCommand {
        /// Node the command ran on.
        node: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured stderr.
        stderr: String,
    },

    /// Spawning the node command runner failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A device-plugin interface announcement could not be parsed
    #[error("invalid resource announcement: {0}")]
    Announcement(#[from] serde_json::Error),

    /// The device plugin announced no interface for a requested resource
    #[error("no interface announced for resource {0}")]
    MissingInterface(String),

    /// Connectivity check between pods failed
    #[error("no connectivity: {0}")]
    Connectivity(String),
}
