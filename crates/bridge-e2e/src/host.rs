//! Command execution on cluster nodes.
//!
//! The CI provider runs each cluster node as a container and ships an exec
//! entrypoint that forwards a command onto the node. [`NodeRunner`] spawns
//! that entrypoint; it does not manage any session of its own.

use tokio::process::Command;
use tracing::debug;

use crate::error::HarnessError;

/// Runs commands on cluster nodes through the provider's exec entrypoint.
#[derive(Debug, Clone)]
pub struct NodeRunner {
    container_prefix: String,
}

impl NodeRunner {
    /// Runner for nodes whose containers are named `<prefix><node>`.
    pub fn new(container_prefix: impl Into<String>) -> Self {
        Self {
            container_prefix: container_prefix.into(),
        }
    }

    /// Runner for the kubevirtci provider layout.
    pub fn kubevirtci() -> Self {
        Self::new("kubevirt-")
    }

    /// Run a command on a node and return stdout split into lines.
    pub async fn run(&self, node: &str, command: &[&str]) -> Result<Vec<String>, HarnessError> {
        let container = format!("{}{}", self.container_prefix, node);
        debug!(%node, ?command, "running command on node");

        let output = Command::new("docker")
            .arg("exec")
            .arg(&container)
            .arg("ssh.sh")
            .args(command)
            .output()
            .await?;

        if !output.status.success() {
            return Err(HarnessError::NodeCommand {
                node: node.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Allow traffic forwarding between pod interfaces on the node.
pub async fn enable_forwarding(runner: &NodeRunner, node: &str) -> Result<(), HarnessError> {
    runner
        .run(node, &["sudo", "iptables", "--policy", "FORWARD", "ACCEPT"])
        .await?;
    Ok(())
}

/// Create an isolated inter-node network: a VLAN on top of `eth0` enslaved
/// to a fresh bridge, both brought up.
pub async fn create_bridge_network(
    runner: &NodeRunner,
    node: &str,
    net_id: u8,
) -> Result<(), HarnessError> {
    let vlan = format!("eth0.{net_id}");
    let bridge = format!("mybr{net_id}");
    let id = net_id.to_string();

    runner
        .run(
            node,
            &[
                "sudo", "ip", "link", "add", "link", "eth0", "name", &vlan, "type", "vlan", "id",
                &id,
            ],
        )
        .await?;
    runner
        .run(node, &["sudo", "ip", "link", "add", "name", &bridge, "type", "bridge"])
        .await?;
    runner
        .run(node, &["sudo", "ip", "link", "set", &vlan, "master", &bridge])
        .await?;
    runner
        .run(node, &["sudo", "ip", "link", "set", &vlan, "up"])
        .await?;
    runner
        .run(node, &["sudo", "ip", "link", "set", &bridge, "up"])
        .await?;
    Ok(())
}

/// Tear down a network created by [`create_bridge_network`].
pub async fn delete_bridge_network(
    runner: &NodeRunner,
    node: &str,
    net_id: u8,
) -> Result<(), HarnessError> {
    let vlan = format!("eth0.{net_id}");
    let bridge = format!("mybr{net_id}");

    runner
        .run(node, &["sudo", "ip", "link", "delete", &vlan])
        .await?;
    runner
        .run(node, &["sudo", "ip", "link", "delete", &bridge])
        .await?;
    Ok(())
}
