//! Input and output types for ragstack activities

use std::time::Duration;

use ragstack_models::{Capability, Component};

use crate::backend::ReleaseHandle;
use crate::values::ValuesOverride;

// ============================================================================
// Ensure Namespace Activity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureNamespaceInput<'a> {
    pub namespace: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureNamespaceOutput {
    /// Whether the namespace was created (false if it already existed)
    pub created: bool,
}

// ============================================================================
// Check Capabilities Activity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCapabilitiesOutput {
    /// Required capabilities no node provides
    pub missing: Vec<Capability>,
}

// ============================================================================
// Apply Component Activity
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApplyComponentInput<'a> {
    pub component: &'a Component,
    /// Rendered chart values, if the component has a template
    pub values: Option<&'a ValuesOverride>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyComponentOutput {
    /// Whether a release existed before the apply
    pub upgraded: bool,
    pub handle: ReleaseHandle,
}

// ============================================================================
// Wait For Ready Activity
// ============================================================================

#[derive(Debug, Clone)]
pub struct WaitForReadyInput<'a> {
    pub component: &'a Component,
    /// Zero means check the current status only
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitForReadyOutput {
    pub is_ready: bool,
}

// ============================================================================
// Delete Component Activity
// ============================================================================

#[derive(Debug, Clone)]
pub struct DeleteComponentInput<'a> {
    pub component: &'a Component,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteComponentOutput {
    /// Whether a release was deleted (false if it didn't exist)
    pub deleted: bool,
}

// ============================================================================
// Delete Storage Activity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStorageOutput {
    /// Names of the deleted claims
    pub deleted_claims: Vec<String>,
}
