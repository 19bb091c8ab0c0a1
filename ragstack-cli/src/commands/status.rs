use anyhow::Result;
use ragstack_orchestrations::cancel::CancelFlag;
use ragstack_orchestrations::registry::Selection;

use super::{connect, CommandOutcome};
use crate::config::Config;
use crate::output::{self, OutputFormat};

/// Components that are down are reported, not treated as failures
pub async fn run_status(
    config: &Config,
    selection: Selection,
    format: OutputFormat,
    cancel: CancelFlag,
) -> Result<CommandOutcome> {
    let registry = config.load_registry()?;
    let orchestrator = connect(config, registry, &selection, cancel).await?;
    let statuses = orchestrator.status(&selection).await?;

    output::print_statuses(&statuses, format)?;
    Ok(CommandOutcome::Success)
}
