//! Test doubles: component builders and an in-memory cluster

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ragstack_models::{
    Capability, ChartSource, Component, ComponentKind, ManifestSource, ReadinessCheck,
};

use crate::backend::{ReleaseBackend, ReleaseHandle};
use crate::error::BackendError;
use crate::k8s_client::{ClusterOps, ResourceHandle, ResourceKind};
use crate::orchestrations::StackOrchestrator;
use crate::registry::ComponentRegistry;
use crate::retry::{BackoffStrategy, RetryPolicy};
use crate::types::OrchestratorSettings;
use crate::values::ValuesOverride;

fn component(name: &str, deps: &[&str], kind: ComponentKind, selector: String) -> Component {
    Component {
        name: name.to_string(),
        kind,
        namespace: String::new(),
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
        pvc_selectors: vec![format!("app={}", name)],
        readiness: ReadinessCheck {
            label_selector: selector,
        },
        requires: Vec::new(),
        optional: false,
        timeout_secs: None,
        service_port: None,
    }
}

pub fn manifest_component(name: &str, deps: &[&str]) -> Component {
    component(
        name,
        deps,
        ComponentKind::Manifest(ManifestSource {
            path: format!("deploy/{}", name),
        }),
        format!("app={}", name),
    )
}

pub fn chart_component(name: &str, deps: &[&str]) -> Component {
    component(
        name,
        deps,
        ComponentKind::Chart(ChartSource {
            repo_name: "repo".to_string(),
            repo_url: "https://charts.example.test".to_string(),
            chart: format!("repo/{}", name),
            version: None,
            release: None,
            values_template: None,
        }),
        format!("app.kubernetes.io/instance={}", name),
    )
}

struct Failure {
    error: BackendError,
    /// `None` fails forever
    remaining: Option<u32>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    installed: HashSet<String>,
    namespaces: HashSet<String>,
    never_ready: HashSet<String>,
    gpu: bool,
    /// selector -> claim names
    claims: HashMap<String, Vec<String>>,
    /// Selectors with running, ready workloads
    workloads: HashSet<String>,
    failures: HashMap<(String, String), Failure>,
}

/// In-memory cluster and backend; every call is recorded as `op:key`
#[derive(Clone, Default)]
pub struct FakeStack {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// Make every `op` call on `key` fail with `error`
    pub fn fail(&self, op: &str, key: &str, error: BackendError) {
        self.with_state(|s| {
            s.failures
                .insert((op.to_string(), key.to_string()), Failure { error, remaining: None })
        });
    }

    /// Make the next `times` calls of `op` on `key` fail with `error`
    pub fn fail_times(&self, op: &str, key: &str, error: BackendError, times: u32) {
        self.with_state(|s| {
            s.failures.insert(
                (op.to_string(), key.to_string()),
                Failure {
                    error,
                    remaining: Some(times),
                },
            )
        });
    }

    pub fn install(&self, name: &str) {
        self.with_state(|s| s.installed.insert(name.to_string()));
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.with_state(|s| s.installed.contains(name))
    }

    pub fn never_ready(&self, name: &str) {
        self.with_state(|s| s.never_ready.insert(name.to_string()));
    }

    pub fn set_gpu(&self, present: bool) {
        self.with_state(|s| s.gpu = present);
    }

    pub fn add_claim(&self, selector: &str, name: &str) {
        self.with_state(|s| {
            s.claims
                .entry(selector.to_string())
                .or_default()
                .push(name.to_string())
        });
    }

    pub fn add_workload(&self, selector: &str) {
        self.with_state(|s| s.workloads.insert(selector.to_string()));
    }

    pub fn claims(&self) -> Vec<String> {
        self.with_state(|s| {
            let mut all: Vec<String> = s.claims.values().flatten().cloned().collect();
            all.sort();
            all
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn count(&self, call: &str) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| *c == call).count())
    }

    /// Record the call, then apply any injected failure
    fn enter(&self, op: &str, key: &str) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.calls.push(format!("{}:{}", op, key));
            let id = (op.to_string(), key.to_string());
            let Some(failure) = s.failures.get_mut(&id) else {
                return Ok(());
            };
            let error = failure.error.clone();
            match failure.remaining {
                None => Err(error),
                Some(0) => Ok(()),
                Some(n) => {
                    failure.remaining = Some(n - 1);
                    Err(error)
                }
            }
        })
    }
}

#[async_trait]
impl ClusterOps for FakeStack {
    async fn check_connectivity(&self) -> Result<(), BackendError> {
        self.enter("connectivity", "cluster")
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool, BackendError> {
        self.enter("namespace_exists", name)?;
        Ok(self.with_state(|s| s.namespaces.contains(name)))
    }

    async fn create_namespace(&self, name: &str) -> Result<(), BackendError> {
        self.enter("create_namespace", name)?;
        self.with_state(|s| s.namespaces.insert(name.to_string()));
        Ok(())
    }

    async fn has_capability(&self, capability: Capability) -> Result<bool, BackendError> {
        self.enter("capability", capability.node_resource())?;
        Ok(self.with_state(|s| s.gpu))
    }

    async fn list_resources(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ResourceHandle>, BackendError> {
        self.enter("list", label_selector)?;
        Ok(self.with_state(|s| {
            s.claims
                .get(label_selector)
                .into_iter()
                .flatten()
                .map(|name| ResourceHandle {
                    kind: ResourceKind::PersistentVolumeClaim,
                    namespace: namespace.to_string(),
                    name: name.clone(),
                })
                .collect()
        }))
    }

    async fn delete_resource(&self, handle: &ResourceHandle) -> Result<(), BackendError> {
        self.enter("delete_claim", &handle.name)?;
        self.with_state(|s| {
            for names in s.claims.values_mut() {
                names.retain(|n| n != &handle.name);
            }
        });
        Ok(())
    }

    async fn workloads_exist(
        &self,
        _namespace: &str,
        label_selector: &str,
    ) -> Result<bool, BackendError> {
        self.enter("workloads", label_selector)?;
        Ok(self.with_state(|s| s.workloads.contains(label_selector)))
    }

    async fn pods_ready(
        &self,
        _namespace: &str,
        label_selector: &str,
        _timeout: Duration,
    ) -> Result<bool, BackendError> {
        self.enter("pods_ready", label_selector)?;
        Ok(self.with_state(|s| s.workloads.contains(label_selector)))
    }
}

#[async_trait]
impl ReleaseBackend for FakeStack {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn release_exists(&self, component: &Component) -> Result<bool, BackendError> {
        self.enter("exists", &component.name)?;
        Ok(self.is_installed(&component.name))
    }

    async fn apply_release(
        &self,
        component: &Component,
        values: Option<&ValuesOverride>,
        _timeout: Duration,
    ) -> Result<ReleaseHandle, BackendError> {
        self.enter("apply", &component.name)?;
        if let Some(values) = values {
            self.with_state(|s| s.calls.push(format!("values:{}", values.as_str().trim())));
        }
        self.install(&component.name);
        Ok(ReleaseHandle {
            name: component.release_name().to_string(),
            namespace: component.namespace.clone(),
            revision: None,
        })
    }

    async fn delete_release(
        &self,
        component: &Component,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        self.enter("delete", &component.name)?;
        self.with_state(|s| s.installed.remove(&component.name));
        Ok(())
    }

    async fn is_ready(
        &self,
        component: &Component,
        _timeout: Duration,
    ) -> Result<bool, BackendError> {
        self.enter("ready", &component.name)?;
        Ok(self.with_state(|s| {
            s.installed.contains(&component.name) && !s.never_ready.contains(&component.name)
        }))
    }
}

/// Orchestrator over `components` in namespace `ns`, backed by `fake`,
/// retrying three times without delay
pub fn orchestrator(components: Vec<Component>, fake: &FakeStack) -> StackOrchestrator {
    let registry = ComponentRegistry::new("ns", components).unwrap();
    let settings = OrchestratorSettings {
        wait_timeout: Duration::from_secs(1),
        retry: RetryPolicy::new(3).with_backoff(BackoffStrategy::None),
    };
    StackOrchestrator::new(
        registry,
        Arc::new(fake.clone()),
        Arc::new(fake.clone()),
        Arc::new(fake.clone()),
        settings,
    )
}

/// A shell script standing in for helm or kubectl.
///
/// Every invocation appends its arguments to `argv.log` and its stdin to
/// `stdin.log` next to the script; `body` then decides what it prints.
pub struct FakeTool {
    dir: PathBuf,
}

impl FakeTool {
    #[cfg(unix)]
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("ragstack-tool-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = format!(
            "#!/bin/sh\nlog=\"$(dirname \"$0\")\"\necho \"$*\" >> \"$log/argv.log\"\ncat >> \"$log/stdin.log\"\n{}\n",
            body
        );
        let program = dir.join("tool");
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    pub fn program(&self) -> PathBuf {
        self.dir.join("tool")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One line of arguments per invocation
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.join("argv.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn stdin(&self) -> String {
        std::fs::read_to_string(self.dir.join("stdin.log")).unwrap_or_default()
    }
}

impl Drop for FakeTool {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
