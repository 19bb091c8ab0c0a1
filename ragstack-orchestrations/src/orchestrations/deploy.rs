//! Deploy orchestration

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use ragstack_models::{
    Component, DeploymentResult, DeploymentStatus, Operation, RunSummary,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::StackOrchestrator;
use crate::activities::{
    apply_component, check_capabilities, ensure_namespace, release_exists, wait_for_ready,
    ActivityContext,
};
use crate::activity_types::{ApplyComponentInput, EnsureNamespaceInput, WaitForReadyInput};
use crate::error::ConfigurationError;
use crate::names::orchestrations::DEPLOY;
use crate::registry::Selection;
use crate::values::{self, ValuesOverride};

/// Per-run state threaded through the component loop
struct DeployRun<'a> {
    selected: HashSet<&'a str>,
    outcomes: HashMap<&'a str, DeploymentStatus>,
    /// Namespaces already ensured this run, with the failure if any
    namespaces: HashMap<String, Result<(), String>>,
}

impl StackOrchestrator {
    /// Apply the selected components in dependency order.
    ///
    /// A component is attempted only after every dependency reported
    /// `applied` or `upgraded` in this run (or, for dependencies outside the
    /// selection, already exists in the cluster). Otherwise it is reported as
    /// `skipped-missing`.
    pub async fn deploy(&self, selection: &Selection) -> Result<RunSummary, ConfigurationError> {
        let selected = self.registry.select(selection)?;

        // Template failures are configuration errors: surface them before any cluster call
        let mut rendered: HashMap<&str, ValuesOverride> = HashMap::new();
        for component in &selected {
            if let Some(v) = values::render(component, self.registry.in_dependency_order())? {
                rendered.insert(component.name.as_str(), v);
            }
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!(
            "deploy",
            operation = DEPLOY,
            run_id = %run_id,
            namespace = %self.registry.namespace()
        );

        let results = async {
            info!(components = selected.len(), "Starting deploy");
            let ctx = self.activity_context();
            let mut run = DeployRun {
                selected: selected.iter().map(|c| c.name.as_str()).collect(),
                outcomes: HashMap::new(),
                namespaces: HashMap::new(),
            };

            let mut results = Vec::with_capacity(selected.len());
            for &component in &selected {
                let values = rendered.get(component.name.as_str());
                let result = self
                    .deploy_component(ctx, &mut run, component, values)
                    .await;
                info!(
                    component = %component.name,
                    status = %result.status,
                    message = %result.message,
                    "Component finished"
                );
                run.outcomes.insert(component.name.as_str(), result.status);
                results.push(result);
            }
            results
        }
        .instrument(span)
        .await;

        Ok(RunSummary {
            run_id,
            operation: Operation::Deploy,
            namespace: self.registry.namespace().to_string(),
            started_at,
            finished_at: Utc::now(),
            results,
        })
    }

    async fn deploy_component(
        &self,
        ctx: ActivityContext<'_>,
        run: &mut DeployRun<'_>,
        component: &Component,
        values: Option<&ValuesOverride>,
    ) -> DeploymentResult {
        let skipped = |message: String| {
            DeploymentResult::new(&component.name, DeploymentStatus::SkippedMissing, message)
        };
        let failed = |message: String| {
            DeploymentResult::new(&component.name, DeploymentStatus::Failed, message)
        };

        if self.cancel.is_cancelled() {
            return skipped("run cancelled before this component started".to_string());
        }

        // Step 1: Dependencies
        if let Err(message) = self.check_dependencies(ctx, run, component).await {
            return skipped(message);
        }

        // Step 2: Hardware capabilities
        if !component.requires.is_empty() {
            match check_capabilities::activity(ctx, component).await {
                Ok(output) if output.missing.is_empty() => {}
                Ok(output) => {
                    let missing: Vec<String> =
                        output.missing.iter().map(|c| c.to_string()).collect();
                    return skipped(format!(
                        "requires {} nodes, none available in the cluster",
                        missing.join(", ")
                    ));
                }
                Err(e) => return skipped(format!("could not verify required capabilities: {}", e)),
            }
        }

        // Step 3: Namespace, once per run
        if let Err(message) = self.ensure_namespace_once(ctx, run, &component.namespace).await {
            return failed(format!("namespace '{}' unavailable: {}", component.namespace, message));
        }

        // Step 4: Install or upgrade
        let timeout = self.timeout_for(component);
        let applied = match apply_component::activity(
            ctx,
            ApplyComponentInput {
                component,
                values,
                timeout,
            },
        )
        .await
        {
            Ok(output) => output,
            Err(e) => return failed(format!("apply failed: {}", e)),
        };

        // Step 5: Readiness
        let ready = wait_for_ready::activity(ctx, WaitForReadyInput { component, timeout }).await;
        match ready {
            Ok(output) if output.is_ready => {
                let revision = applied
                    .handle
                    .revision
                    .map(|r| format!(" (revision {})", r))
                    .unwrap_or_default();
                if applied.upgraded {
                    DeploymentResult::new(
                        &component.name,
                        DeploymentStatus::Upgraded,
                        format!("upgraded{} and ready", revision),
                    )
                } else {
                    DeploymentResult::new(
                        &component.name,
                        DeploymentStatus::Applied,
                        format!("installed{} and ready", revision),
                    )
                }
            }
            Ok(_) => failed(format!("not ready within {}s", timeout.as_secs())),
            Err(e) => failed(format!("readiness check failed: {}", e)),
        }
    }

    async fn check_dependencies(
        &self,
        ctx: ActivityContext<'_>,
        run: &DeployRun<'_>,
        component: &Component,
    ) -> Result<(), String> {
        for dependency in &component.depends_on {
            if run.selected.contains(dependency.as_str()) {
                let ready = run
                    .outcomes
                    .get(dependency.as_str())
                    .is_some_and(|s| s.is_ready_for_dependents());
                if !ready {
                    return Err(format!("dependency '{}' did not become ready", dependency));
                }
                continue;
            }

            let Some(dep) = self.registry.get(dependency) else {
                return Err(format!("dependency '{}' is not defined", dependency));
            };
            match release_exists::activity(ctx, dep).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(format!(
                        "dependency '{}' is not installed and was not selected",
                        dependency
                    ))
                }
                Err(e) => {
                    return Err(format!("could not verify dependency '{}': {}", dependency, e))
                }
            }
        }
        Ok(())
    }

    async fn ensure_namespace_once(
        &self,
        ctx: ActivityContext<'_>,
        run: &mut DeployRun<'_>,
        namespace: &str,
    ) -> Result<(), String> {
        if let Some(state) = run.namespaces.get(namespace) {
            return state.clone();
        }

        let state = ensure_namespace::activity(ctx, EnsureNamespaceInput { namespace })
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(namespace = %namespace, error = %e, "Failed to ensure namespace");
                e.to_string()
            });
        run.namespaces.insert(namespace.to_string(), state.clone());
        state
    }
}
