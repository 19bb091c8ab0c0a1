use std::path::PathBuf;
use std::time::Duration;

use ragstack_orchestrations::error::ConfigurationError;
use ragstack_orchestrations::registry::ComponentRegistry;
use ragstack_orchestrations::retry::{BackoffStrategy, RetryPolicy};
use ragstack_orchestrations::OrchestratorSettings;

use crate::cli::GlobalArgs;

/// Ceiling for the linear retry backoff
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` leaves the namespace to the registry document
    pub namespace: Option<String>,
    /// `None` uses the shipped stack
    pub registry: Option<PathBuf>,
    pub wait_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_base: Duration,
    /// Base for relative manifest overlay paths
    pub manifest_root: PathBuf,
    pub helm_bin: PathBuf,
    pub kubectl_bin: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigurationError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        Ok(Self {
            namespace: lookup("RAGSTACK_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            registry: lookup("RAGSTACK_REGISTRY").map(PathBuf::from),
            wait_timeout: Duration::from_secs(parse_number(
                "RAGSTACK_WAIT_TIMEOUT_SECS",
                lookup("RAGSTACK_WAIT_TIMEOUT_SECS"),
                600,
            )?),
            retry_attempts: parse_number(
                "RAGSTACK_RETRY_ATTEMPTS",
                lookup("RAGSTACK_RETRY_ATTEMPTS"),
                3,
            )?,
            retry_base: Duration::from_secs(parse_number(
                "RAGSTACK_RETRY_BASE_SECS",
                lookup("RAGSTACK_RETRY_BASE_SECS"),
                2,
            )?),
            manifest_root: lookup("RAGSTACK_MANIFEST_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            helm_bin: lookup("HELM_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("helm")),
            kubectl_bin: lookup("KUBECTL_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("kubectl")),
        })
    }

    /// Apply command-line flags on top of the environment
    pub fn with_overrides(mut self, global: &GlobalArgs) -> Self {
        if let Some(namespace) = &global.namespace {
            self.namespace = Some(namespace.clone());
        }
        if let Some(registry) = &global.registry {
            self.registry = Some(registry.clone());
        }
        if let Some(secs) = global.timeout {
            self.wait_timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            wait_timeout: self.wait_timeout,
            retry: RetryPolicy::new(self.retry_attempts).with_backoff(BackoffStrategy::Linear {
                base: self.retry_base,
                max: MAX_RETRY_DELAY,
            }),
        }
    }

    /// Load the registry. An explicit namespace wins over the document's own,
    /// which wins over the default.
    pub fn load_registry(&self) -> Result<ComponentRegistry, ConfigurationError> {
        let namespace = self.namespace.as_deref();
        match &self.registry {
            Some(path) => ComponentRegistry::from_file(path, namespace),
            None => ComponentRegistry::builtin(namespace),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigurationError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigurationError::InvalidSetting {
                name: name.to_string(),
                message: format!("'{}': {}", raw, e),
            }),
    }
}
