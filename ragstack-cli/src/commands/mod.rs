pub mod deploy;
pub mod preflight;
pub mod status;
pub mod teardown;

use std::sync::Arc;

use anyhow::Result;
use ragstack_models::RunSummary;
use ragstack_orchestrations::backend::{HelmBackend, KustomizeBackend, ToolCommand};
use ragstack_orchestrations::cancel::CancelFlag;
use ragstack_orchestrations::error::ConfigurationError;
use ragstack_orchestrations::k8s_client::{ClusterOps, KubeCluster};
use ragstack_orchestrations::registry::{ComponentRegistry, Selection};
use ragstack_orchestrations::StackOrchestrator;

use crate::config::Config;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_PRECONDITION: u8 = 1;
pub const EXIT_PARTIAL: u8 = 2;
pub const EXIT_CONFIGURATION: u8 = 3;

/// How a command that ran to completion should exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Some components failed or were skipped
    PartialFailure,
}

impl CommandOutcome {
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.has_failures() {
            CommandOutcome::PartialFailure
        } else {
            CommandOutcome::Success
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            CommandOutcome::Success => EXIT_SUCCESS,
            CommandOutcome::PartialFailure => EXIT_PARTIAL,
        }
    }
}

/// Exit code for an error that aborted the command
///
/// Errors outside the configuration/precondition taxonomy (I/O on the
/// terminal, serialization) also exit with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigurationError>().is_some() {
        EXIT_CONFIGURATION
    } else {
        EXIT_PRECONDITION
    }
}

/// Validate `selection`, run the preflight checks and wire the orchestrator
/// to the real cluster.
pub async fn connect(
    config: &Config,
    registry: ComponentRegistry,
    selection: &Selection,
    cancel: CancelFlag,
) -> Result<StackOrchestrator> {
    // Selection errors must surface before the first cluster call
    let selected = registry.select(selection)?;
    let client = preflight::run(config, &selected).await?;
    let cluster: Arc<dyn ClusterOps> = Arc::new(KubeCluster::new(client));

    let orchestrator = StackOrchestrator::new(
        registry,
        cluster.clone(),
        Arc::new(HelmBackend::new(
            ToolCommand::new(&config.helm_bin),
            cluster.clone(),
        )),
        Arc::new(KustomizeBackend::new(
            ToolCommand::new(&config.kubectl_bin),
            cluster,
            &config.manifest_root,
        )),
        config.settings(),
    )
    .with_cancel_flag(cancel);

    Ok(orchestrator)
}
