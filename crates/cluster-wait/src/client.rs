//! Kubernetes-backed cluster state.
//!
//! [`KubeCluster`] implements the collaborator traits against a live API
//! server: change subscriptions through `kube_runtime::watcher`, one-shot
//! reads through `get_opt`, command execution through the pod exec channel,
//! and log retrieval through the pod log endpoint.

use std::time::Duration;

use futures::{Stream, StreamExt};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, AttachParams, LogParams};
use kube::{Client, ResourceExt};
use kube_runtime::watcher;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::cluster_trait::{ClusterState, EventStream, LogSource, RemoteExec};
use crate::error::WaitError;
use crate::models::{ObservedState, ResourceKind, WatchTarget};

/// Interval between log fetches when a pod-log target is subscribed to.
///
/// Logs have no push channel, so the subscription is a polling adapter.
const LOG_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cluster state backed by a `kube` client.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster").finish_non_exhaustive()
    }
}

impl KubeCluster {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster configuration.
    pub async fn try_default() -> Result<Self, WaitError> {
        Ok(Self {
            client: Client::try_default().await?,
        })
    }

    /// The underlying client, for direct API access.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn namespace_of<'a>(&'a self, target: &'a WatchTarget) -> &'a str {
        target.namespace_or(self.client.default_namespace())
    }
}

#[async_trait::async_trait]
impl ClusterState for KubeCluster {
    async fn subscribe(&self, target: &WatchTarget) -> Result<EventStream, WaitError> {
        let namespace = self.namespace_of(target).to_string();
        debug!(kind = ?target.kind, %namespace, "subscribing to cluster state");

        let stream = match target.kind {
            ResourceKind::Node => {
                let api = Api::<Node>::all(self.client.clone());
                map_watch(watcher(api, watcher::Config::default()), node_state)
            }
            ResourceKind::DaemonSet => {
                let api = Api::<DaemonSet>::namespaced(self.client.clone(), &namespace);
                map_watch(watcher(api, watcher::Config::default()), daemon_set_state)
            }
            ResourceKind::Pod => {
                let api = Api::<Pod>::namespaced(self.client.clone(), &namespace);
                map_watch(watcher(api, watcher::Config::default()), pod_state)
            }
            ResourceKind::PodLog => {
                let api = Api::<Pod>::namespaced(self.client.clone(), &namespace);
                log_poll_stream(api, target.name.clone())
            }
        };

        Ok(stream)
    }

    async fn current(&self, target: &WatchTarget) -> Result<Option<ObservedState>, WaitError> {
        let namespace = self.namespace_of(target).to_string();

        match target.kind {
            ResourceKind::Node => {
                let api = Api::<Node>::all(self.client.clone());
                Ok(api.get_opt(&target.name).await?.map(|n| node_state(&n)))
            }
            ResourceKind::DaemonSet => {
                let api = Api::<DaemonSet>::namespaced(self.client.clone(), &namespace);
                Ok(api.get_opt(&target.name).await?.map(|ds| daemon_set_state(&ds)))
            }
            ResourceKind::Pod => {
                let api = Api::<Pod>::namespaced(self.client.clone(), &namespace);
                Ok(api.get_opt(&target.name).await?.map(|p| pod_state(&p)))
            }
            ResourceKind::PodLog => {
                let api = Api::<Pod>::namespaced(self.client.clone(), &namespace);
                match api.logs(&target.name, &LogParams::default()).await {
                    Ok(text) => Ok(Some(ObservedState::Log { text })),
                    Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl RemoteExec for KubeCluster {
    async fn run(&self, pod: &str, namespace: &str, command: &str) -> Result<String, WaitError> {
        let pods = Api::<Pod>::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        debug!(%pod, %namespace, %command, "running command in pod");

        let mut process = pods
            .exec(pod, ["/bin/sh", "-c", command], &params)
            .await
            .map_err(|e| WaitError::RemoteCommandFailed(e.to_string()))?;

        let mut stdout = process.stdout().ok_or_else(|| {
            WaitError::RemoteCommandFailed("exec stdout channel unavailable".to_string())
        })?;
        let mut output = String::new();
        stdout
            .read_to_string(&mut output)
            .await
            .map_err(|e| WaitError::RemoteCommandFailed(format!("reading exec output: {e}")))?;

        let status = match process.take_status() {
            Some(status) => status.await,
            None => None,
        };
        process
            .join()
            .await
            .map_err(|e| WaitError::RemoteCommandFailed(e.to_string()))?;

        if let Some(status) = status {
            if status.status.as_deref() != Some("Success") {
                let detail = status
                    .message
                    .or(status.reason)
                    .unwrap_or_else(|| "command exited with failure".to_string());
                return Err(WaitError::RemoteCommandFailed(detail));
            }
        }

        Ok(output)
    }
}

#[async_trait::async_trait]
impl LogSource for KubeCluster {
    async fn logs(&self, pod: &str, namespace: &str) -> Result<String, WaitError> {
        let pods = Api::<Pod>::namespaced(self.client.clone(), namespace);
        Ok(pods.logs(pod, &LogParams::default()).await?)
    }
}

/// Map a raw watcher stream into identity/state notification pairs.
///
/// `Apply`, `InitApply` and `Delete` all carry an object snapshot and are
/// forwarded; `Init`/`InitDone` are watcher bookkeeping and skipped.
fn map_watch<K, S, F>(stream: S, to_state: F) -> EventStream
where
    K: ResourceExt,
    S: Stream<Item = Result<watcher::Event<K>, watcher::Error>> + Send + 'static,
    F: Fn(&K) -> ObservedState + Send + 'static,
{
    Box::pin(stream.filter_map(move |event| {
        let item = match event {
            Ok(
                watcher::Event::Apply(obj)
                | watcher::Event::InitApply(obj)
                | watcher::Event::Delete(obj),
            ) => Some(Ok((obj.name_any(), to_state(&obj)))),
            Ok(watcher::Event::Init | watcher::Event::InitDone) => None,
            Err(e) => Some(Err(WaitError::Watch(e.to_string()))),
        };
        futures::future::ready(item)
    }))
}

/// Adapt the pull-only log endpoint into a notification stream.
fn log_poll_stream(api: Api<Pod>, name: String) -> EventStream {
    Box::pin(futures::stream::unfold(
        (api, name, true),
        |(api, name, first)| async move {
            if !first {
                tokio::time::sleep(LOG_POLL_INTERVAL).await;
            }
            let item = match api.logs(&name, &LogParams::default()).await {
                Ok(text) => Ok((name.clone(), ObservedState::Log { text })),
                Err(e) => Err(WaitError::Kube(e)),
            };
            Some((item, (api, name, false)))
        },
    ))
}

fn node_state(node: &Node) -> ObservedState {
    ObservedState::Node {
        allocatable: node
            .status
            .as_ref()
            .and_then(|s| s.allocatable.clone())
            .unwrap_or_default(),
    }
}

fn daemon_set_state(ds: &DaemonSet) -> ObservedState {
    let status = ds.status.as_ref();
    ObservedState::DaemonSet {
        number_available: status.and_then(|s| s.number_available).unwrap_or(0),
        number_unavailable: status.and_then(|s| s.number_unavailable).unwrap_or(0),
    }
}

fn pod_state(pod: &Pod) -> ObservedState {
    ObservedState::Pod {
        phase: pod.status.as_ref().and_then(|s| s.phase.clone()),
    }
}
