//! Stack orchestrations: deploy, teardown and status over a component registry

use std::sync::Arc;
use std::time::Duration;

use ragstack_models::Component;

use crate::activities::ActivityContext;
use crate::backend::ReleaseBackend;
use crate::cancel::CancelFlag;
use crate::k8s_client::ClusterOps;
use crate::registry::ComponentRegistry;
use crate::types::OrchestratorSettings;

mod deploy;
mod status;
mod teardown;

/// Walks the registry in dependency order and drives the backends.
///
/// Components are handled one at a time. Component-level failures end up in
/// the returned results; only configuration errors abort a run.
pub struct StackOrchestrator {
    registry: ComponentRegistry,
    cluster: Arc<dyn ClusterOps>,
    charts: Arc<dyn ReleaseBackend>,
    manifests: Arc<dyn ReleaseBackend>,
    settings: OrchestratorSettings,
    cancel: CancelFlag,
}

impl StackOrchestrator {
    pub fn new(
        registry: ComponentRegistry,
        cluster: Arc<dyn ClusterOps>,
        charts: Arc<dyn ReleaseBackend>,
        manifests: Arc<dyn ReleaseBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            cluster,
            charts,
            manifests,
            settings,
            cancel: CancelFlag::new(),
        }
    }

    /// Share an externally owned cancel flag (e.g. set from a Ctrl-C handler)
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn activity_context(&self) -> ActivityContext<'_> {
        ActivityContext {
            cluster: self.cluster.as_ref(),
            charts: self.charts.as_ref(),
            manifests: self.manifests.as_ref(),
            retry: &self.settings.retry,
        }
    }

    fn timeout_for(&self, component: &Component) -> Duration {
        component
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.settings.wait_timeout)
    }
}
