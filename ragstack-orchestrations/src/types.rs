//! Input and output types for ragstack orchestrations

use std::time::Duration;

use ragstack_models::RunSummary;

use crate::retry::RetryPolicy;

// ============================================================================
// Orchestrator settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Wait bound for each apply/delete/readiness call, unless the component
    /// sets its own
    pub wait_timeout: Duration,
    /// Retry budget for retryable backend failures
    pub retry: RetryPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

// ============================================================================
// Teardown Orchestration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownOptions {
    /// Also delete the components' persistent volume claims
    pub delete_storage: bool,
    /// Skip the storage deletion confirmation
    pub assume_yes: bool,
}

#[derive(Debug, Clone)]
pub enum TeardownOutcome {
    /// Every selected component was visited
    Completed(RunSummary),
    /// The operator declined the storage deletion; nothing was deleted
    Declined,
}
