//! Status orchestration

use std::time::Duration;

use ragstack_models::ComponentStatus;
use tracing::{debug, info_span, Instrument};

use super::StackOrchestrator;
use crate::activities::{release_exists, wait_for_ready};
use crate::activity_types::WaitForReadyInput;
use crate::error::ConfigurationError;
use crate::names::orchestrations::STATUS;
use crate::registry::Selection;

impl StackOrchestrator {
    /// Report whether each selected component is installed and ready.
    ///
    /// Read-only. Lookup failures are reported per component.
    pub async fn status(
        &self,
        selection: &Selection,
    ) -> Result<Vec<ComponentStatus>, ConfigurationError> {
        let selected = self.registry.select(selection)?;
        let span = info_span!("status", operation = STATUS, namespace = %self.registry.namespace());

        let statuses = async {
            let ctx = self.activity_context();
            let mut statuses = Vec::with_capacity(selected.len());
            for &component in &selected {
                let status = match release_exists::activity(ctx, component).await {
                    Ok(false) => ComponentStatus {
                        component: component.name.clone(),
                        installed: false,
                        ready: false,
                        message: "not installed".to_string(),
                    },
                    Ok(true) => {
                        let input = WaitForReadyInput {
                            component,
                            timeout: Duration::ZERO,
                        };
                        match wait_for_ready::activity(ctx, input).await {
                            Ok(output) => ComponentStatus {
                                component: component.name.clone(),
                                installed: true,
                                ready: output.is_ready,
                                message: if output.is_ready { "ready" } else { "not ready" }
                                    .to_string(),
                            },
                            Err(e) => ComponentStatus {
                                component: component.name.clone(),
                                installed: true,
                                ready: false,
                                message: format!("readiness unknown: {}", e),
                            },
                        }
                    }
                    Err(e) => ComponentStatus {
                        component: component.name.clone(),
                        installed: false,
                        ready: false,
                        message: format!("lookup failed: {}", e),
                    },
                };
                debug!(component = %status.component, ready = status.ready, "Status collected");
                statuses.push(status);
            }
            statuses
        }
        .instrument(span)
        .await;

        Ok(statuses)
    }
}
