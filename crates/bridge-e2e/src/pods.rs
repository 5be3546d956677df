//! Pod discovery helpers.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};

use crate::error::HarnessError;

/// Names of the pods a daemon set owns in a namespace.
pub async fn daemon_set_pods(
    client: &Client,
    daemon_set: &str,
    namespace: &str,
) -> Result<Vec<String>, HarnessError> {
    let api = Api::<Pod>::namespaced(client.clone(), namespace);
    let pods = api.list(&ListParams::default()).await?;

    Ok(pods
        .items
        .iter()
        .filter(|pod| {
            pod.owner_references()
                .iter()
                .any(|owner| owner.name == daemon_set)
        })
        .map(ResourceExt::name_any)
        .collect())
}
