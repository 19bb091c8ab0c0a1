//! Manifest-based components applied from Kustomize overlays with `kubectl`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ragstack_models::{Component, ComponentKind, ManifestSource};
use serde::Deserialize;
use tracing::debug;

use super::{ReleaseBackend, ReleaseHandle, ToolCommand};
use crate::error::BackendError;
use crate::k8s_client::ClusterOps;
use crate::values::ValuesOverride;

/// Kinds the teardown leaves behind unless storage deletion was asked for
const RETAINED_KINDS: &[&str] = &["PersistentVolumeClaim"];

pub struct KustomizeBackend {
    kubectl: ToolCommand,
    cluster: Arc<dyn ClusterOps>,
    /// Base for relative overlay paths
    manifest_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RenderedObject {
    kind: String,
    metadata: RenderedMetadata,
}

#[derive(Debug, Deserialize)]
struct RenderedMetadata {
    name: String,
}

impl KustomizeBackend {
    pub fn new(
        kubectl: ToolCommand,
        cluster: Arc<dyn ClusterOps>,
        manifest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kubectl,
            cluster,
            manifest_root: manifest_root.into(),
        }
    }

    fn overlay_of(&self, component: &Component) -> Result<PathBuf, BackendError> {
        let source: &ManifestSource = match &component.kind {
            ComponentKind::Manifest(source) => source,
            ComponentKind::Chart(_) => {
                return Err(BackendError::rejected(format!(
                    "component '{}' is not manifest-based",
                    component.name
                )))
            }
        };
        Ok(resolve_overlay(&self.manifest_root, &source.path))
    }

    async fn render(&self, overlay: &Path) -> Result<String, BackendError> {
        self.kubectl
            .run(
                &["kustomize".to_string(), overlay.display().to_string()],
                None,
                Duration::from_secs(60),
            )
            .await
    }
}

fn resolve_overlay(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// `kind/name` references for every rendered object except retained kinds
fn deletable_objects(rendered: &str) -> Result<Vec<String>, BackendError> {
    let mut refs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(rendered) {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| BackendError::rejected(format!("invalid rendered manifest: {}", e)))?;
        if value.is_null() {
            continue;
        }
        let object: RenderedObject = serde_yaml::from_value(value)
            .map_err(|e| BackendError::rejected(format!("invalid rendered manifest: {}", e)))?;
        if RETAINED_KINDS.contains(&object.kind.as_str()) {
            continue;
        }
        refs.push(format!("{}/{}", object.kind.to_lowercase(), object.metadata.name));
    }
    Ok(refs)
}

#[async_trait]
impl ReleaseBackend for KustomizeBackend {
    fn name(&self) -> &'static str {
        "kustomize"
    }

    async fn release_exists(&self, component: &Component) -> Result<bool, BackendError> {
        self.overlay_of(component)?;
        self.cluster
            .workloads_exist(&component.namespace, &component.readiness.label_selector)
            .await
    }

    async fn apply_release(
        &self,
        component: &Component,
        _values: Option<&ValuesOverride>,
        timeout: Duration,
    ) -> Result<ReleaseHandle, BackendError> {
        let overlay = self.overlay_of(component)?;
        if !overlay.is_dir() {
            return Err(BackendError::rejected(format!(
                "overlay directory {} does not exist",
                overlay.display()
            )));
        }

        let stdout = self
            .kubectl
            .run(
                &[
                    "apply".to_string(),
                    "--kustomize".to_string(),
                    overlay.display().to_string(),
                    "--namespace".to_string(),
                    component.namespace.clone(),
                    format!("--request-timeout={}s", timeout.as_secs()),
                ],
                None,
                timeout,
            )
            .await?;
        debug!(component = %component.name, output = %stdout.trim(), "kubectl apply finished");

        Ok(ReleaseHandle {
            name: component.name.clone(),
            namespace: component.namespace.clone(),
            revision: None,
        })
    }

    async fn delete_release(
        &self,
        component: &Component,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        let overlay = self.overlay_of(component)?;
        let rendered = self.render(&overlay).await?;
        let objects = deletable_objects(&rendered)?;
        if objects.is_empty() {
            return Ok(());
        }

        let mut argv = vec!["delete".to_string()];
        argv.extend(objects);
        argv.extend([
            "--namespace".to_string(),
            component.namespace.clone(),
            "--ignore-not-found".to_string(),
            "--wait".to_string(),
            format!("--timeout={}s", timeout.as_secs()),
        ]);

        self.kubectl.run(&argv, None, timeout).await.map(|_| ())
    }

    async fn is_ready(
        &self,
        component: &Component,
        timeout: Duration,
    ) -> Result<bool, BackendError> {
        self.cluster
            .pods_ready(
                &component.namespace,
                &component.readiness.label_selector,
                timeout,
            )
            .await
    }
}
