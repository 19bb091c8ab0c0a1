//! Release backends: one polymorphic operation set over chart-based and
//! manifest-based components
//!
//! The orchestrator never looks at how a release is applied. It asks a
//! backend whether the release exists, applies it, waits for readiness and
//! deletes it.

use std::time::Duration;

use async_trait::async_trait;
use ragstack_models::Component;

use crate::error::BackendError;
use crate::values::ValuesOverride;

mod command;
mod helm;
mod kustomize;

pub use command::{classify_failure, ToolCommand};
pub use helm::HelmBackend;
pub use kustomize::KustomizeBackend;

/// What an apply call left behind in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    pub name: String,
    pub namespace: String,
    /// Helm revision; manifests have none
    pub revision: Option<u32>,
}

#[async_trait]
pub trait ReleaseBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn release_exists(&self, component: &Component) -> Result<bool, BackendError>;

    /// Install or upgrade the component's release
    async fn apply_release(
        &self,
        component: &Component,
        values: Option<&ValuesOverride>,
        timeout: Duration,
    ) -> Result<ReleaseHandle, BackendError>;

    /// Remove the release. Storage claims are left in place.
    async fn delete_release(
        &self,
        component: &Component,
        timeout: Duration,
    ) -> Result<(), BackendError>;

    /// Wait up to `timeout` for the workload to serve
    async fn is_ready(&self, component: &Component, timeout: Duration)
        -> Result<bool, BackendError>;
}
