use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A deployable unit of the stack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Unique identifier, stable across runs
    pub name: String,
    /// Install mechanism
    pub kind: ComponentKind,
    /// Target namespace (filled from the registry default when empty)
    #[serde(default)]
    pub namespace: String,
    /// Components that must be ready before this one is applied
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Label selectors for storage claims removed by a destructive teardown
    #[serde(default)]
    pub pvc_selectors: Vec<String>,
    /// How to decide the workload is serving
    pub readiness: ReadinessCheck,
    /// Cluster capabilities the workload cannot run without
    #[serde(default)]
    pub requires: Vec<Capability>,
    /// Only deployed when explicitly asked for
    #[serde(default)]
    pub optional: bool,
    /// Per-component wait timeout, overrides the global one
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// In-cluster service port, used to build URLs for other components
    #[serde(default)]
    pub service_port: Option<u16>,
}

impl Component {
    /// Name of the Helm release, or the component name for manifests
    pub fn release_name(&self) -> &str {
        match &self.kind {
            ComponentKind::Chart(chart) => chart.release.as_deref().unwrap_or(&self.name),
            ComponentKind::Manifest(_) => &self.name,
        }
    }

    /// In-cluster base URL of the component's service, if it exposes a port
    pub fn service_url(&self) -> Option<String> {
        self.service_port.map(|port| {
            format!(
                "http://{}.{}.svc.cluster.local:{}",
                self.release_name(),
                self.namespace,
                port
            )
        })
    }

    pub fn is_chart(&self) -> bool {
        matches!(self.kind, ComponentKind::Chart(_))
    }
}

/// Install mechanism of a component
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentKind {
    /// Packaged chart applied as a Helm release
    Chart(ChartSource),
    /// Raw resources applied from a Kustomize overlay
    Manifest(ManifestSource),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSource {
    /// Local alias of the chart repository (e.g. "qdrant")
    pub repo_name: String,
    /// Chart repository URL
    pub repo_url: String,
    /// Chart reference, usually "<repo>/<chart>"
    pub chart: String,
    /// Pinned chart version
    #[serde(default)]
    pub version: Option<String>,
    /// Release name when it differs from the component name
    #[serde(default)]
    pub release: Option<String>,
    /// Tera template rendered into the values override
    #[serde(default)]
    pub values_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSource {
    /// Kustomize directory, relative paths resolve against the manifest root
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessCheck {
    /// Pods matching this selector must all report Ready
    pub label_selector: String,
}

/// Hardware or cluster capability a component depends on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Gpu,
}

impl Capability {
    /// Extended resource advertised by nodes that provide the capability
    pub fn node_resource(&self) -> &'static str {
        match self {
            Capability::Gpu => "nvidia.com/gpu",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Gpu => write!(f, "GPU"),
        }
    }
}

/// Outcome of one apply/delete attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStatus {
    Applied,
    Upgraded,
    SkippedMissing,
    Failed,
    Deleted,
    NotFound,
}

impl DeploymentStatus {
    /// Whether dependents may proceed after this outcome
    pub fn is_ready_for_dependents(&self) -> bool {
        matches!(self, DeploymentStatus::Applied | DeploymentStatus::Upgraded)
    }

    /// Whether this outcome makes the run a partial failure
    pub fn is_failure(&self) -> bool {
        matches!(self, DeploymentStatus::Failed | DeploymentStatus::SkippedMissing)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::Applied => "applied",
            DeploymentStatus::Upgraded => "upgraded",
            DeploymentStatus::SkippedMissing => "skipped-missing",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Deleted => "deleted",
            DeploymentStatus::NotFound => "not-found",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentResult {
    pub component: String,
    pub status: DeploymentStatus,
    pub message: String,
}

impl DeploymentResult {
    pub fn new(
        component: impl Into<String>,
        status: DeploymentStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            status,
            message: message.into(),
        }
    }
}

/// Read-only view of a component reported by `status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: String,
    pub installed: bool,
    pub ready: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Deploy,
    Teardown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deploy => f.write_str("deploy"),
            Operation::Teardown => f.write_str("teardown"),
        }
    }
}

/// Results of one deploy or teardown run, in the order they were produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub operation: Operation,
    pub namespace: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<DeploymentResult>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status.is_failure())
    }

    pub fn result_for(&self, component: &str) -> Option<&DeploymentResult> {
        self.results.iter().find(|r| r.component == component)
    }

    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_component() -> Component {
        Component {
            name: "qdrant".to_string(),
            kind: ComponentKind::Chart(ChartSource {
                repo_name: "qdrant".to_string(),
                repo_url: "https://qdrant.github.io/qdrant-helm".to_string(),
                chart: "qdrant/qdrant".to_string(),
                version: None,
                release: None,
                values_template: None,
            }),
            namespace: "ragstack".to_string(),
            depends_on: vec![],
            pvc_selectors: vec![],
            readiness: ReadinessCheck {
                label_selector: "app.kubernetes.io/instance=qdrant".to_string(),
            },
            requires: vec![],
            optional: false,
            timeout_secs: None,
            service_port: Some(6333),
        }
    }

    #[test]
    fn test_component_from_yaml() {
        let yaml = r#"
name: colqwen2
dependsOn: [rag-anything]
kind:
  type: manifest
  path: deploy/colqwen2
readiness:
  labelSelector: app=colqwen2
requires: [gpu]
optional: true
timeoutSecs: 900
"#;
        let component: Component = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(component.name, "colqwen2");
        assert_eq!(component.depends_on, vec!["rag-anything".to_string()]);
        assert_eq!(component.requires, vec![Capability::Gpu]);
        assert!(component.optional);
        assert!(component.namespace.is_empty());
        assert_eq!(component.timeout_secs, Some(900));
        assert!(matches!(component.kind, ComponentKind::Manifest(ref m) if m.path == "deploy/colqwen2"));
    }

    #[test]
    fn test_release_name_defaults_to_component_name() {
        let mut component = chart_component();
        assert_eq!(component.release_name(), "qdrant");

        if let ComponentKind::Chart(chart) = &mut component.kind {
            chart.release = Some("vector-db".to_string());
        }
        assert_eq!(component.release_name(), "vector-db");
    }

    #[test]
    fn test_service_url() {
        let component = chart_component();
        assert_eq!(
            component.service_url().as_deref(),
            Some("http://qdrant.ragstack.svc.cluster.local:6333")
        );
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&DeploymentStatus::SkippedMissing).unwrap();
        assert_eq!(json, "\"skipped-missing\"");
        assert_eq!(DeploymentStatus::NotFound.to_string(), "not-found");
        assert_eq!(format!("{:<10}|", DeploymentStatus::Failed), "failed    |");
    }

    #[test]
    fn test_summary_failures() {
        let now = Utc::now();
        let mut summary = RunSummary {
            run_id: Uuid::new_v4(),
            operation: Operation::Teardown,
            namespace: "ragstack".to_string(),
            started_at: now,
            finished_at: now,
            results: vec![
                DeploymentResult::new("a", DeploymentStatus::Deleted, "ok"),
                DeploymentResult::new("b", DeploymentStatus::NotFound, "not installed"),
            ],
        };
        assert!(!summary.has_failures());

        summary
            .results
            .push(DeploymentResult::new("c", DeploymentStatus::SkippedMissing, "dep failed"));
        assert!(summary.has_failures());
        assert_eq!(summary.result_for("b").unwrap().status, DeploymentStatus::NotFound);
    }
}
