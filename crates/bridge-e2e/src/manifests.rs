//! Typed fixtures for the bridge device-plugin scenario.
//!
//! The scenario deploys three things into the test namespace: a config map
//! naming the bridges the plugin exposes, the plugin itself as a daemon set,
//! and a set of consumer pods requesting the bridge resources. Everything is
//! built as `k8s-openapi` objects so fixtures are checked at compile time.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, ConfigMap, ConfigMapKeySelector, Container, EnvVar, EnvVarSource,
    HostPathVolumeSource, Pod, PodSpec, PodTemplateSpec, ResourceRequirements, SecurityContext,
    Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

/// Resource domain under which the plugin publishes bridges.
pub const RESOURCE_DOMAIN: &str = "bridge.network.kubevirt.io";

/// Bridges exposed by the plugin in this scenario.
pub const BRIDGES: [&str; 2] = ["mybr1", "mybr2"];

/// Name of the config map listing the exposed bridges.
pub const CONFIG_MAP_NAME: &str = "device-plugin-network-bridge";

/// Name of the device-plugin daemon set.
pub const DAEMON_SET_NAME: &str = "bridge-device-plugin";

const PLUGIN_IMAGE: &str = "quay.io/kubevirt/device-plugin-network-bridge:latest";
const CONSUMER_IMAGE: &str = "docker.io/library/alpine:3.20";
const DEVICE_PLUGIN_PATH: &str = "/var/lib/kubelet/device-plugins";

/// Fully qualified resource name for a bridge.
pub fn bridge_resource(bridge: &str) -> String {
    format!("{RESOURCE_DOMAIN}/{bridge}")
}

/// Config map naming the bridges the plugin should expose as resources.
pub fn bridge_config_map(bridges: &[&str]) -> ConfigMap {
    let mut data = BTreeMap::new();
    data.insert("bridges".to_string(), bridges.join(","));

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(CONFIG_MAP_NAME.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

/// The device plugin, deployed on every node.
///
/// The plugin needs the kubelet's device-plugin socket directory and a
/// privileged container to manage links on the host.
pub fn device_plugin_daemon_set() -> DaemonSet {
    let labels = BTreeMap::from([("name".to_string(), DAEMON_SET_NAME.to_string())]);

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(DAEMON_SET_NAME.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: DAEMON_SET_NAME.to_string(),
                        image: Some(PLUGIN_IMAGE.to_string()),
                        security_context: Some(SecurityContext {
                            privileged: Some(true),
                            ..Default::default()
                        }),
                        env: Some(vec![EnvVar {
                            name: "BRIDGES".to_string(),
                            value_from: Some(EnvVarSource {
                                config_map_key_ref: Some(ConfigMapKeySelector {
                                    name: CONFIG_MAP_NAME.to_string(),
                                    key: "bridges".to_string(),
                                    ..Default::default()
                                }),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }]),
                        volume_mounts: Some(vec![VolumeMount {
                            name: "device-plugins".to_string(),
                            mount_path: DEVICE_PLUGIN_PATH.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: "device-plugins".to_string(),
                        host_path: Some(HostPathVolumeSource {
                            path: DEVICE_PLUGIN_PATH.to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Consumer pods requesting one unit of every given bridge resource.
///
/// Pods are named `bridge-consumer-1` onwards and left to the scheduler:
/// while no node reports the resources as allocatable they stay `Pending`,
/// which the scenario asserts on. The container carries `NET_ADMIN` so
/// addresses can be assigned to the attached interfaces from inside.
pub fn consumer_pods(count: usize, bridges: &[&str]) -> Vec<Pod> {
    let mut limits = BTreeMap::new();
    for bridge in bridges {
        limits.insert(bridge_resource(bridge), Quantity("1".to_string()));
    }

    (1..=count)
        .map(|number| Pod {
            metadata: ObjectMeta {
                name: Some(format!("bridge-consumer-{number}")),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "consumer".to_string(),
                    image: Some(CONSUMER_IMAGE.to_string()),
                    command: Some(vec![
                        "/bin/sh".to_string(),
                        "-c".to_string(),
                        "sleep 86400".to_string(),
                    ]),
                    security_context: Some(SecurityContext {
                        capabilities: Some(Capabilities {
                            add: Some(vec!["NET_ADMIN".to_string()]),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    resources: Some(ResourceRequirements {
                        limits: Some(limits.clone()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}
