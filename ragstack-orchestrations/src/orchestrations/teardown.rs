//! Teardown orchestration

use chrono::Utc;
use ragstack_models::{Component, DeploymentResult, DeploymentStatus, Operation, RunSummary};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::StackOrchestrator;
use crate::activities::{delete_component, delete_storage, ActivityContext};
use crate::activity_types::DeleteComponentInput;
use crate::error::ConfigurationError;
use crate::names::orchestrations::TEARDOWN;
use crate::prompt::OperatorPrompt;
use crate::registry::Selection;
use crate::types::{TeardownOptions, TeardownOutcome};

impl StackOrchestrator {
    /// Remove the selected components in reverse dependency order.
    ///
    /// Every selected component is visited even when an earlier one fails.
    /// Storage claims are only removed with `delete_storage`, after the
    /// operator confirmed (or `assume_yes` is set).
    pub async fn teardown(
        &self,
        selection: &Selection,
        options: &TeardownOptions,
        prompt: &dyn OperatorPrompt,
    ) -> Result<TeardownOutcome, ConfigurationError> {
        let mut selected = self.registry.select(selection)?;
        selected.reverse();

        if options.delete_storage && !options.assume_yes {
            let names: Vec<&str> = selected.iter().map(|c| c.name.as_str()).collect();
            let question = format!(
                "Delete persistent storage of {}? This cannot be undone.",
                names.join(", ")
            );
            if !prompt.confirm(&question) {
                info!("Storage deletion declined, nothing removed");
                return Ok(TeardownOutcome::Declined);
            }
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!(
            "teardown",
            operation = TEARDOWN,
            run_id = %run_id,
            namespace = %self.registry.namespace()
        );

        let results = async {
            info!(
                components = selected.len(),
                delete_storage = options.delete_storage,
                "Starting teardown"
            );
            let ctx = self.activity_context();
            let mut results = Vec::with_capacity(selected.len());
            for &component in &selected {
                let result = self.teardown_component(ctx, component, options).await;
                info!(
                    component = %component.name,
                    status = %result.status,
                    message = %result.message,
                    "Component finished"
                );
                results.push(result);
            }
            results
        }
        .instrument(span)
        .await;

        Ok(TeardownOutcome::Completed(RunSummary {
            run_id,
            operation: Operation::Teardown,
            namespace: self.registry.namespace().to_string(),
            started_at,
            finished_at: Utc::now(),
            results,
        }))
    }

    async fn teardown_component(
        &self,
        ctx: ActivityContext<'_>,
        component: &Component,
        options: &TeardownOptions,
    ) -> DeploymentResult {
        if self.cancel.is_cancelled() {
            return DeploymentResult::new(
                &component.name,
                DeploymentStatus::SkippedMissing,
                "run cancelled before this component started",
            );
        }

        let input = DeleteComponentInput {
            component,
            timeout: self.timeout_for(component),
        };
        let (status, mut message) = match delete_component::activity(ctx, input).await {
            Ok(output) if output.deleted => {
                (DeploymentStatus::Deleted, "release deleted".to_string())
            }
            Ok(_) => (DeploymentStatus::NotFound, "release not installed".to_string()),
            Err(e) => {
                // Claims stay while their workload may still be mounting them
                return DeploymentResult::new(
                    &component.name,
                    DeploymentStatus::Failed,
                    format!("delete failed: {}", e),
                );
            }
        };

        if options.delete_storage {
            match delete_storage::activity(ctx, component).await {
                Ok(output) if output.deleted_claims.is_empty() => {
                    message.push_str("; no storage claims found");
                }
                Ok(output) => {
                    message.push_str(&format!(
                        "; storage deleted ({})",
                        output.deleted_claims.join(", ")
                    ));
                }
                Err(e) => {
                    warn!(component = %component.name, error = %e, "Storage cleanup failed");
                    return DeploymentResult::new(
                        &component.name,
                        DeploymentStatus::Failed,
                        format!("{} but storage cleanup failed: {}", message, e),
                    );
                }
            }
        }

        DeploymentResult::new(&component.name, status, message)
    }
}
