//! Connectivity smoke checks for the test environment.
//!
//! Run these first when setting up a cluster for the bridge scenario: they
//! verify the API server is reachable and the provider's node containers
//! accept commands.

use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};

use bridge_e2e::NodeRunner;

fn expected_nodes() -> Vec<String> {
    std::env::var("BRIDGE_E2E_NODES")
        .unwrap_or_else(|_| "node01,node02".to_string())
        .split(',')
        .map(str::to_string)
        .collect()
}

#[tokio::test]
#[ignore] // Requires a reachable cluster
async fn cluster_lists_the_expected_nodes() {
    let client = Client::try_default()
        .await
        .expect("Failed to connect to cluster");

    let nodes = Api::<Node>::all(client)
        .list(&ListParams::default())
        .await
        .expect("Failed to list nodes");

    let mut names: Vec<_> = nodes.items.iter().map(ResourceExt::name_any).collect();
    names.sort();
    let mut expected = expected_nodes();
    expected.sort();
    assert_eq!(names, expected);
}

#[tokio::test]
#[ignore] // Requires the provider's node containers
async fn node_runner_reaches_every_node() {
    let runner = NodeRunner::kubevirtci();

    for node in expected_nodes() {
        let stdout = runner
            .run(&node, &["hostname"])
            .await
            .expect("Failed to run command on node");
        assert_eq!(stdout.first().map(String::as_str), Some(node.as_str()));
    }
}
