use anyhow::Result;
use ragstack_orchestrations::cancel::CancelFlag;
use ragstack_orchestrations::registry::Selection;
use tracing::info;

use super::{connect, CommandOutcome};
use crate::config::Config;
use crate::output::{self, OutputFormat};

pub async fn run_deploy(
    config: &Config,
    selection: Selection,
    format: OutputFormat,
    cancel: CancelFlag,
) -> Result<CommandOutcome> {
    let registry = config.load_registry()?;
    info!(namespace = %registry.namespace(), selection = ?selection, "Deploying stack");

    let orchestrator = connect(config, registry, &selection, cancel).await?;
    let summary = orchestrator.deploy(&selection).await?;

    output::print_summary(&summary, format)?;
    Ok(CommandOutcome::from_summary(&summary))
}
