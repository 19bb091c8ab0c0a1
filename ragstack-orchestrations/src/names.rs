//! Name constants for ragstack orchestrations and activities
//!
//! Used as operation names in logs and retry diagnostics: {crate-name}::{type}::{name}

/// Orchestration names
pub mod orchestrations {
    /// Apply selected components in dependency order
    ///
    /// **Activities used:**
    /// - [`super::activities::ENSURE_NAMESPACE`]
    /// - [`super::activities::CHECK_CAPABILITIES`]
    /// - [`super::activities::APPLY_COMPONENT`]
    /// - [`super::activities::WAIT_FOR_READY`]
    pub const DEPLOY: &str = "ragstack-orchestrations::orchestration::deploy";

    /// Remove selected components in reverse dependency order
    ///
    /// **Activities used:**
    /// - [`super::activities::DELETE_COMPONENT`]
    /// - [`super::activities::DELETE_STORAGE`]
    pub const TEARDOWN: &str = "ragstack-orchestrations::orchestration::teardown";

    /// Report installation and readiness without changing anything
    pub const STATUS: &str = "ragstack-orchestrations::orchestration::status";
}

/// Activity names
pub mod activities {
    /// Create the target namespace if absent
    ///
    /// **Idempotent:** Yes
    pub const ENSURE_NAMESPACE: &str = "ragstack-orchestrations::activity::ensure-namespace";

    /// Verify nodes provide the capabilities a component requires
    pub const CHECK_CAPABILITIES: &str = "ragstack-orchestrations::activity::check-capabilities";

    /// Look up whether a release exists
    pub const RELEASE_EXISTS: &str = "ragstack-orchestrations::activity::release-exists";

    /// Install or upgrade a component's release
    ///
    /// **Idempotent:** Yes (upgrade of an existing release)
    pub const APPLY_COMPONENT: &str = "ragstack-orchestrations::activity::apply-component";

    /// Wait for a component's pods to report Ready
    pub const WAIT_FOR_READY: &str = "ragstack-orchestrations::activity::wait-for-ready";

    /// Remove a component's release
    ///
    /// **Idempotent:** Yes (no-op if not installed)
    pub const DELETE_COMPONENT: &str = "ragstack-orchestrations::activity::delete-component";

    /// Remove a component's persistent volume claims
    pub const DELETE_STORAGE: &str = "ragstack-orchestrations::activity::delete-storage";
}
