//! Chart-based releases through the `helm` CLI

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ragstack_models::{ChartSource, Component, ComponentKind};
use tracing::info;

use super::{ReleaseBackend, ReleaseHandle, ToolCommand};
use crate::error::{BackendError, BackendErrorKind};
use crate::k8s_client::ClusterOps;
use crate::values::ValuesOverride;

/// Bound for repository and status calls, which do not take a `--timeout`
const QUICK_CALL_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HelmBackend {
    helm: ToolCommand,
    /// Readiness is read from the cluster, not from helm
    cluster: Arc<dyn ClusterOps>,
    /// Repositories already added/updated during this run
    repos_ready: Mutex<HashSet<String>>,
}

impl HelmBackend {
    pub fn new(helm: ToolCommand, cluster: Arc<dyn ClusterOps>) -> Self {
        Self {
            helm,
            cluster,
            repos_ready: Mutex::new(HashSet::new()),
        }
    }

    fn chart_of(component: &Component) -> Result<&ChartSource, BackendError> {
        match &component.kind {
            ComponentKind::Chart(chart) => Ok(chart),
            ComponentKind::Manifest(_) => Err(BackendError::rejected(format!(
                "component '{}' is not chart-based",
                component.name
            ))),
        }
    }

    fn repo_is_ready(&self, repo: &str) -> bool {
        self.repos_ready
            .lock()
            .map(|set| set.contains(repo))
            .unwrap_or(false)
    }

    async fn ensure_repo(&self, chart: &ChartSource) -> Result<(), BackendError> {
        if self.repo_is_ready(&chart.repo_name) {
            return Ok(());
        }

        info!(repo = %chart.repo_name, url = %chart.repo_url, "Adding Helm repository");
        self.helm
            .run(
                &args(["repo", "add", &chart.repo_name, &chart.repo_url, "--force-update"]),
                None,
                QUICK_CALL_TIMEOUT,
            )
            .await?;
        self.helm
            .run(&args(["repo", "update", &chart.repo_name]), None, QUICK_CALL_TIMEOUT)
            .await?;

        if let Ok(mut set) = self.repos_ready.lock() {
            set.insert(chart.repo_name.clone());
        }
        Ok(())
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Build `helm upgrade --install` arguments
fn upgrade_args(
    component: &Component,
    chart: &ChartSource,
    with_values: bool,
    timeout: Duration,
) -> Vec<String> {
    let mut argv = args([
        "upgrade",
        "--install",
        component.release_name(),
        &chart.chart,
        "--namespace",
        &component.namespace,
    ]);
    if let Some(version) = &chart.version {
        argv.push("--version".to_string());
        argv.push(version.clone());
    }
    if with_values {
        argv.push("--values".to_string());
        argv.push("-".to_string());
    }
    argv.push("--timeout".to_string());
    argv.push(format!("{}s", timeout.as_secs()));
    argv
}

/// Pick `REVISION: n` out of helm's release notes
fn parse_revision(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("REVISION:"))
        .and_then(|rev| rev.trim().parse().ok())
}

#[async_trait]
impl ReleaseBackend for HelmBackend {
    fn name(&self) -> &'static str {
        "helm"
    }

    async fn release_exists(&self, component: &Component) -> Result<bool, BackendError> {
        Self::chart_of(component)?;
        let result = self
            .helm
            .run(
                &args(["status", component.release_name(), "--namespace", &component.namespace]),
                None,
                QUICK_CALL_TIMEOUT,
            )
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if e.kind == BackendErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn apply_release(
        &self,
        component: &Component,
        values: Option<&ValuesOverride>,
        timeout: Duration,
    ) -> Result<ReleaseHandle, BackendError> {
        let chart = Self::chart_of(component)?;
        self.ensure_repo(chart).await?;

        let argv = upgrade_args(component, chart, values.is_some(), timeout);
        let stdout = self
            .helm
            .run(&argv, values.map(ValuesOverride::as_str), timeout)
            .await?;

        Ok(ReleaseHandle {
            name: component.release_name().to_string(),
            namespace: component.namespace.clone(),
            revision: parse_revision(&stdout),
        })
    }

    async fn delete_release(
        &self,
        component: &Component,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        Self::chart_of(component)?;
        let timeout_arg = format!("{}s", timeout.as_secs());
        self.helm
            .run(
                &args([
                    "uninstall",
                    component.release_name(),
                    "--namespace",
                    &component.namespace,
                    "--wait",
                    "--timeout",
                    &timeout_arg,
                ]),
                None,
                timeout,
            )
            .await
            .map(|_| ())
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
