//! In-pod network inspection and configuration.
//!
//! The device plugin announces attached interfaces to consumer pods through
//! `NETWORK_INTERFACE_RESOURCES_*` environment variables, one JSON document
//! per allocation. These helpers read the announcements back out of a running
//! pod, assign addresses to the attached interfaces, and verify connectivity.

use std::collections::HashMap;

use cluster_wait::RemoteExec;
use serde::Deserialize;
use tracing::debug;

use crate::error::HarnessError;

/// Prefix of the env vars carrying interface announcements.
pub const RESOURCE_ENV_PREFIX: &str = "NETWORK_INTERFACE_RESOURCES_";

/// One announced allocation: the resource it belongs to and its interfaces.
#[derive(Debug, Deserialize)]
struct ResourceAnnouncement {
    name: String,
    interfaces: Vec<InterfaceEntry>,
}

/// An interface attached to a consumer pod.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InterfaceEntry {
    /// Interface name inside the pod.
    pub name: String,
}

/// Read the pod's interface announcements, grouped by resource name.
///
/// Multiple allocations of the same resource accumulate under one key.
pub async fn interfaces_by_resource<E>(
    exec: &E,
    pod: &str,
    namespace: &str,
) -> Result<HashMap<String, Vec<InterfaceEntry>>, HarnessError>
where
    E: RemoteExec + ?Sized,
{
    let raw = exec.run(pod, namespace, "env").await?;
    parse_announcements(&raw)
}

fn parse_announcements(env_output: &str) -> Result<HashMap<String, Vec<InterfaceEntry>>, HarnessError> {
    let mut grouped: HashMap<String, Vec<InterfaceEntry>> = HashMap::new();

    for line in env_output.lines() {
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        if !name.starts_with(RESOURCE_ENV_PREFIX) {
            continue;
        }
        let announcement: ResourceAnnouncement = serde_json::from_str(value)?;
        debug!(resource = %announcement.name, interfaces = announcement.interfaces.len(),
            "found interface announcement");
        grouped
            .entry(announcement.name)
            .or_default()
            .extend(announcement.interfaces);
    }

    Ok(grouped)
}

/// Name of the first interface attached to the pod for a resource.
pub async fn resource_interface<E>(
    exec: &E,
    pod: &str,
    namespace: &str,
    resource: &str,
) -> Result<String, HarnessError>
where
    E: RemoteExec + ?Sized,
{
    let grouped = interfaces_by_resource(exec, pod, namespace).await?;
    grouped
        .get(resource)
        .and_then(|interfaces| interfaces.first())
        .map(|interface| interface.name.clone())
        .ok_or_else(|| HarnessError::MissingInterface(resource.to_string()))
}

/// Assign an address to the pod's interface for a resource.
pub async fn add_address<E>(
    exec: &E,
    pod: &str,
    namespace: &str,
    resource: &str,
    address: &str,
) -> Result<(), HarnessError>
where
    E: RemoteExec + ?Sized,
{
    let interface = resource_interface(exec, pod, namespace, resource).await?;
    exec.run(
        pod,
        namespace,
        &format!("ip address add {address} dev {interface}"),
    )
    .await?;
    Ok(())
}

/// Ping `destination` from the pod through a specific interface.
///
/// Partial loss is tolerated; total loss fails the check.
pub async fn check_ping<E>(
    exec: &E,
    pod: &str,
    namespace: &str,
    destination: &str,
    interface: &str,
) -> Result<(), HarnessError>
where
    E: RemoteExec + ?Sized,
{
    let output = exec
        .run(
            pod,
            namespace,
            &format!("ping {destination} -W 5 -c 5 -I {interface}"),
        )
        .await?;

    if output.contains("100% packet loss") {
        return Err(HarnessError::Connectivity(format!(
            "{pod} cannot reach {destination} over {interface}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcements_are_grouped_by_resource() {
        let env = concat!(
            "PATH=/usr/bin\n",
            "NETWORK_INTERFACE_RESOURCES_ABCDEFGH=",
            r#"{"name":"bridge.network.kubevirt.io/mybr1","interfaces":[{"name":"net0"}]}"#,
            "\n",
            "NETWORK_INTERFACE_RESOURCES_IJKLMNOP=",
            r#"{"name":"bridge.network.kubevirt.io/mybr1","interfaces":[{"name":"net1"}]}"#,
            "\n",
            "HOME=/root\n",
        );

        let grouped = parse_announcements(env).unwrap();
        assert_eq!(grouped.len(), 1);
        let interfaces = &grouped["bridge.network.kubevirt.io/mybr1"];
        assert_eq!(
            interfaces,
            &vec![
                InterfaceEntry {
                    name: "net0".to_string()
                },
                InterfaceEntry {
                    name: "net1".to_string()
                }
            ]
        );
    }

    #[test]
    fn unrelated_env_vars_are_ignored() {
        let grouped = parse_announcements("PATH=/usr/bin\nTERM=xterm\n").unwrap();
        assert!(grouped.is_empty());
    }

    #[test]
    fn extra_announcement_fields_are_tolerated() {
        let env = concat!(
            "NETWORK_INTERFACE_RESOURCES_QRSTUVWX=",
            r#"{"name":"bridge.network.kubevirt.io/mybr2","interfaces":[{"name":"net0","type":"ethernet"}]}"#,
            "\n",
        );

        let grouped = parse_announcements(env).unwrap();
        assert_eq!(grouped["bridge.network.kubevirt.io/mybr2"][0].name, "net0");
    }

    #[test]
    fn malformed_announcements_are_an_error() {
        let env = "NETWORK_INTERFACE_RESOURCES_BROKEN=not-json\n";
        assert!(matches!(
            parse_announcements(env),
            Err(HarnessError::Announcement(_))
        ));
    }

    #[tokio::test]
    async fn ping_check_fails_on_total_loss() {
        use cluster_wait::MockExec;

        let exec = MockExec::new();
        exec.push_ok("5 packets transmitted, 0 received, 100% packet loss, time 4000ms");
        let result = check_ping(&exec, "bridge-consumer-1", "e2e", "192.168.1.24", "net0").await;
        assert!(matches!(result, Err(HarnessError::Connectivity(_))));
    }

    #[tokio::test]
    async fn ping_check_accepts_partial_loss() {
        use cluster_wait::MockExec;

        let exec = MockExec::new();
        exec.push_ok("5 packets transmitted, 4 received, 20% packet loss, time 4010ms");
        check_ping(&exec, "bridge-consumer-1", "e2e", "192.168.1.24", "net0")
            .await
            .unwrap();
    }
}
