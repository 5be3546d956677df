//! Wait errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while waiting on cluster state.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The condition was not satisfied within the given budget
    #[error("condition was not satisfied within {0:?}")]
    TimedOut(Duration),

    /// The notification stream ended before the condition was satisfied
    #[error("watch stream closed before the condition was satisfied")]
    ChannelClosed,

    /// The notification stream reported an error
    #[error("watch stream failed: {0}")]
    Watch(String),

    /// A command run inside a pod failed or could not be delivered
    #[error("remote command failed: {0}")]
    RemoteCommandFailed(String),

    /// Pod logs never contained the expected output
    #[error("logs of pod {pod} did not contain {expected:?}")]
    LogExpectation {
        /// Pod whose logs were checked.
        pod: String,
        /// Substring that was expected to appear.
        expected: String,
    },

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}
