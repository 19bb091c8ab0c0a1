//! Shared Kubernetes client utilities and the cluster-level operations port

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Node, PersistentVolumeClaim, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use ragstack_models::Capability;
use tracing::debug;

use crate::error::BackendError;

/// How often readiness is re-checked while waiting
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Get a Kubernetes client
pub async fn get_k8s_client() -> anyhow::Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}

/// A namespaced resource the orchestrator may remove directly
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PersistentVolumeClaim,
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ResourceKind::PersistentVolumeClaim => {
                write!(f, "persistentvolumeclaim/{}", self.name)
            }
        }
    }
}

/// Cluster operations that are not tied to one release
#[async_trait]
pub trait ClusterOps: Send + Sync {
    /// Fails with `Unreachable` when the API server cannot be reached
    async fn check_connectivity(&self) -> Result<(), BackendError>;

    async fn namespace_exists(&self, name: &str) -> Result<bool, BackendError>;

    /// Create the namespace; succeeds if it already exists
    async fn create_namespace(&self, name: &str) -> Result<(), BackendError>;

    async fn has_capability(&self, capability: Capability) -> Result<bool, BackendError>;

    async fn list_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ResourceHandle>, BackendError>;

    /// Delete a resource; a resource that is already gone is not an error
    async fn delete_resource(&self, handle: &ResourceHandle) -> Result<(), BackendError>;

    /// Whether any Deployment or StatefulSet carries the selector
    async fn workloads_exist(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<bool, BackendError>;

    /// Wait up to `timeout` for every pod matching the selector to be ready
    async fn pods_ready(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, BackendError>;
}

/// [`ClusterOps`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn check_connectivity(&self) -> Result<(), BackendError> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| BackendError::unreachable(e.to_string()))?;
        debug!(version = %version.git_version, "API server reachable");
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool, BackendError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        match namespaces.get(name).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_namespace(&self, name: &str) -> Result<(), BackendError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        match namespaces.create(&PostParams::default(), &namespace).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn has_capability(&self, capability: Capability) -> Result<bool, BackendError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes.list(&ListParams::default()).await?;
        let resource = capability.node_resource();

        Ok(node_list.items.iter().any(|node| {
            node.status
                .as_ref()
                .and_then(|s| s.allocatable.as_ref())
                .and_then(|a| a.get(resource))
                .is_some_and(|q| q.0 != "0")
        }))
    }

    async fn list_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ResourceHandle>, BackendError> {
        let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let list = pvcs
            .list(&ListParams::default().labels(label_selector))
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|pvc| pvc.metadata.name)
            .map(|name| ResourceHandle {
                kind: ResourceKind::PersistentVolumeClaim,
                namespace: namespace.to_string(),
                name,
            })
            .collect())
    }

    async fn delete_resource(&self, handle: &ResourceHandle) -> Result<(), BackendError> {
        match handle.kind {
            ResourceKind::PersistentVolumeClaim => {
                let pvcs: Api<PersistentVolumeClaim> =
                    Api::namespaced(self.client.clone(), &handle.namespace);
                match pvcs.delete(&handle.name, &DeleteParams::default()).await {
                    Ok(_) => Ok(()),
                    Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn workloads_exist(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<bool, BackendError> {
        workloads_exist(&self.client, namespace, label_selector).await
    }

    async fn pods_ready(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, BackendError> {
        wait_for_pods_ready(&self.client, namespace, label_selector, timeout).await
    }
}

/// Check if any Deployment or StatefulSet carries the label selector
pub async fn workloads_exist(
    client: &Client,
    namespace: &str,
    label_selector: &str,
) -> Result<bool, BackendError> {
    let params = ListParams::default().labels(label_selector).limit(1);

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    if !deployments.list(&params).await?.items.is_empty() {
        return Ok(true);
    }

    let statefulsets: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
    Ok(!statefulsets.list(&params).await?.items.is_empty())
}

/// Time until `deadline`; no deadline always leaves one more poll interval
fn time_left(deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now),
        None => READY_POLL_INTERVAL,
    }
}

/// Pod readiness snapshot for a label selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodReadiness {
    /// Phase of the first pod not ready, or "Running" when all are
    pub phase: String,
    pub is_ready: bool,
}

/// Check current pod status, no waiting
pub async fn check_pods_ready(
    client: &Client,
    namespace: &str,
    label_selector: &str,
) -> Result<PodReadiness, BackendError> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod_list = pods
        .list(&ListParams::default().labels(label_selector))
        .await?;

    Ok(readiness_of(&pod_list.items))
}

fn readiness_of(pods: &[Pod]) -> PodReadiness {
    if pods.is_empty() {
        return PodReadiness {
            phase: "NotFound".to_string(),
            is_ready: false,
        };
    }

    for pod in pods {
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let ready = pod
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            });

        if !ready {
            return PodReadiness {
                phase,
                is_ready: false,
            };
        }
    }

    PodReadiness {
        phase: "Running".to_string(),
        is_ready: true,
    }
}

/// Poll until every pod matching the selector is ready or `timeout` elapses.
///
/// A zero timeout performs a single check. A timeout too large to
/// represent waits without a deadline.
pub async fn wait_for_pods_ready(
    client: &Client,
    namespace: &str,
    label_selector: &str,
    timeout: Duration,
) -> Result<bool, BackendError> {
    let deadline = Instant::now().checked_add(timeout);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let readiness = check_pods_ready(client, namespace, label_selector).await?;
        if readiness.is_ready {
            return Ok(true);
        }

        let now = Instant::now();
        let remaining = time_left(deadline, now);
        if remaining.is_zero() {
            debug!(
                selector = %label_selector,
                phase = %readiness.phase,
                attempts = attempt,
                "Pods not ready before deadline"
            );
            return Ok(false);
        }

        debug!(
            selector = %label_selector,
            phase = %readiness.phase,
            attempt = attempt,
            "Pods not ready yet, waiting"
        );
        tokio::time::sleep(READY_POLL_INTERVAL.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};

    fn pod(phase: &str, ready: bool) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                conditions: Some(vec![PodCondition {
                    type_: "Ready".to_string(),
                    status: if ready { "True" } else { "False" }.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_pods_is_not_ready() {
        let readiness = readiness_of(&[]);
        assert!(!readiness.is_ready);
        assert_eq!(readiness.phase, "NotFound");
    }

    #[test]
    fn test_all_pods_must_be_ready() {
        assert!(readiness_of(&[pod("Running", true), pod("Running", true)]).is_ready);

        let readiness = readiness_of(&[pod("Running", true), pod("Pending", false)]);
        assert!(!readiness.is_ready);
        assert_eq!(readiness.phase, "Pending");
    }

    #[test]
    fn test_time_left() {
        let now = Instant::now();
        assert_eq!(time_left(Some(now), now), Duration::ZERO);
        assert_eq!(
            time_left(Some(now + Duration::from_secs(3)), now),
            Duration::from_secs(3)
        );
        // Huge timeouts overflow the deadline and keep polling
        let deadline = now.checked_add(Duration::from_secs(u64::MAX));
        assert_eq!(time_left(deadline, now), READY_POLL_INTERVAL);
    }

    #[test]
    fn test_pvc_handle_display() {
        let handle = ResourceHandle {
            kind: ResourceKind::PersistentVolumeClaim,
            namespace: "ragstack".to_string(),
            name: "qdrant-storage-qdrant-0".to_string(),
        };
        assert_eq!(handle.to_string(), "persistentvolumeclaim/qdrant-storage-qdrant-0");
    }
}
