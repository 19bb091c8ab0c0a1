use anyhow::Result;
use ragstack_orchestrations::cancel::CancelFlag;
use ragstack_orchestrations::prompt::OperatorPrompt;
use ragstack_orchestrations::registry::{ComponentRegistry, Selection};
use ragstack_orchestrations::{TeardownOptions, TeardownOutcome};
use tracing::info;

use super::{connect, CommandOutcome};
use crate::config::Config;
use crate::output::{self, OutputFormat};

/// Ask which components to remove; `None` when the operator picked nothing
fn choose_from_menu(
    registry: &ComponentRegistry,
    prompt: &dyn OperatorPrompt,
) -> Option<Selection> {
    let options: Vec<String> = registry.names().map(str::to_string).collect();
    let picked = prompt.choose("Select components to uninstall:", &options);
    if picked.is_empty() {
        None
    } else {
        Some(Selection::Only(picked))
    }
}

pub async fn run_teardown(
    config: &Config,
    selection: Option<Selection>,
    options: TeardownOptions,
    format: OutputFormat,
    prompt: &dyn OperatorPrompt,
    cancel: CancelFlag,
) -> Result<CommandOutcome> {
    let registry = config.load_registry()?;

    let selection = match selection {
        Some(selection) => selection,
        None => match choose_from_menu(&registry, prompt) {
            Some(selection) => selection,
            None => {
                println!("Nothing selected.");
                return Ok(CommandOutcome::Success);
            }
        },
    };
    info!(
        namespace = %registry.namespace(),
        selection = ?selection,
        delete_storage = options.delete_storage,
        "Tearing down stack"
    );

    let orchestrator = connect(config, registry, &selection, cancel).await?;
    match orchestrator.teardown(&selection, &options, prompt).await? {
        TeardownOutcome::Completed(summary) => {
            output::print_summary(&summary, format)?;
            Ok(CommandOutcome::from_summary(&summary))
        }
        TeardownOutcome::Declined => {
            println!("Teardown cancelled, nothing was deleted.");
            Ok(CommandOutcome::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragstack_orchestrations::prompt::ScriptedPrompt;

    #[test]
    fn test_menu_selection() {
        let registry = ComponentRegistry::builtin(None).unwrap();

        let prompt = ScriptedPrompt::new().choose_with(vec!["colqwen2".into(), "qdrant".into()]);
        assert_eq!(
            choose_from_menu(&registry, &prompt),
            Some(Selection::Only(vec!["colqwen2".into(), "qdrant".into()]))
        );
        assert_eq!(prompt.asked(), vec!["Select components to uninstall:".to_string()]);

        let nothing = ScriptedPrompt::new();
        assert_eq!(choose_from_menu(&registry, &nothing), None);
    }
}
