//! Ragstack Orchestrations - deploy, teardown and status of the RAG stack on Kubernetes
//!
//! This crate validates the component registry, drives the Helm and Kustomize
//! backends in dependency order and reports one result per component.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragstack_orchestrations::backend::{HelmBackend, KustomizeBackend, ToolCommand};
//! use ragstack_orchestrations::k8s_client::{get_k8s_client, ClusterOps, KubeCluster};
//! use ragstack_orchestrations::registry::{ComponentRegistry, Selection};
//! use ragstack_orchestrations::{OrchestratorSettings, StackOrchestrator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cluster: Arc<dyn ClusterOps> = Arc::new(KubeCluster::new(get_k8s_client().await?));
//! let orchestrator = StackOrchestrator::new(
//!     ComponentRegistry::builtin(None)?,
//!     cluster.clone(),
//!     Arc::new(HelmBackend::new(ToolCommand::new("helm"), cluster.clone())),
//!     Arc::new(KustomizeBackend::new(ToolCommand::new("kubectl"), cluster, ".")),
//!     OrchestratorSettings::default(),
//! );
//!
//! let summary = orchestrator
//!     .deploy(&Selection::Default { include_optional: false })
//!     .await?;
//! println!("{} components, failures: {}", summary.results.len(), summary.has_failures());
//! # Ok(())
//! # }
//! ```

// Orchestration exports
pub mod names;
pub mod registry;
pub mod types;

// Activity exports
pub mod activity_types;
pub mod backend;
pub mod k8s_client;

pub mod cancel;
pub mod error;
pub mod prompt;
pub mod retry;
pub mod values;

mod activities;
mod orchestrations;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use orchestrations::StackOrchestrator;
pub use types::*;
