//! Single-step operations the orchestrations are built from
//!
//! Every backend or cluster call made here goes through the retry policy.

use ragstack_models::Component;

use crate::backend::ReleaseBackend;
use crate::k8s_client::ClusterOps;
use crate::retry::RetryPolicy;

pub mod apply_component;
pub mod check_capabilities;
pub mod delete_component;
pub mod delete_storage;
pub mod ensure_namespace;
pub mod release_exists;
pub mod wait_for_ready;

/// Handles shared by all activities of one run
#[derive(Clone, Copy)]
pub struct ActivityContext<'a> {
    pub cluster: &'a dyn ClusterOps,
    pub charts: &'a dyn ReleaseBackend,
    pub manifests: &'a dyn ReleaseBackend,
    pub retry: &'a RetryPolicy,
}

impl<'a> ActivityContext<'a> {
    /// Backend responsible for the component's kind
    pub fn backend_for(&self, component: &Component) -> &'a dyn ReleaseBackend {
        if component.is_chart() {
            self.charts
        } else {
            self.manifests
        }
    }
}
