//! Ephemeral test namespaces.

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, DeleteParams, PostParams};
use tracing::info;
use uuid::Uuid;

use crate::error::HarnessError;

/// A uniquely named namespace created for one scenario run.
///
/// Deletion is explicit so a failed run can leave the namespace behind for
/// inspection.
#[derive(Debug)]
pub struct TestNamespace {
    api: Api<Namespace>,
    name: String,
}

impl TestNamespace {
    /// Create a fresh `bridge-e2e-*` namespace.
    pub async fn create(client: Client) -> Result<Self, HarnessError> {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("bridge-e2e-{}", &suffix[..8]);

        let api = Api::<Namespace>::all(client);
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&PostParams::default(), &namespace).await?;
        info!(%name, "created test namespace");

        Ok(Self { api, name })
    }

    /// Name of the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delete the namespace and everything in it.
    pub async fn delete(self) -> Result<(), HarnessError> {
        info!(name = %self.name, "deleting test namespace");
        self.api.delete(&self.name, &DeleteParams::default()).await?;
        Ok(())
    }
}
