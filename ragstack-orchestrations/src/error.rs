//! Error taxonomy shared by the registry, backends and orchestrations

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Invalid registry or selection. Raised before any cluster call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("failed to parse registry: {0}")]
    Parse(String),

    #[error("registry defines no components")]
    Empty,

    #[error("component '{0}' is defined more than once")]
    DuplicateComponent(String),

    #[error("component '{component}' depends on undefined component '{dependency}'")]
    UndefinedDependency {
        component: String,
        dependency: String,
    },

    #[error("dependency cycle between components: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("unknown component '{0}' in selection")]
    UnknownComponent(String),

    #[error("invalid values template for '{component}': {message}")]
    Template { component: String, message: String },

    #[error("cannot read registry {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("invalid value for {name}: {message}")]
    InvalidSetting { name: String, message: String },
}

/// The environment cannot support the run at all
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("required tool not found: {tool} - {hint}")]
    ToolMissing { tool: String, hint: String },

    #[error("cluster unreachable: {0}")]
    ClusterUnreachable(String),
}

/// Category of a failed backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Unreachable,
    Timeout,
    Rejected,
    NotFound,
}

impl BackendErrorKind {
    /// Only transport-level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendErrorKind::Unreachable | BackendErrorKind::Timeout)
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendErrorKind::Unreachable => "unreachable",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Rejected => "rejected",
            BackendErrorKind::NotFound => "not found",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unreachable, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            BackendErrorKind::Timeout,
            format!("no response within {}s", after.as_secs()),
        )
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<kube::Error> for BackendError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) if response.code == 404 => {
                BackendError::not_found(response.message)
            }
            kube::Error::Api(response) if response.code == 408 || response.code == 504 => {
                BackendError::new(BackendErrorKind::Timeout, response.message)
            }
            kube::Error::Api(response) => BackendError::rejected(format!(
                "{} ({})",
                response.message, response.code
            )),
            other => BackendError::unreachable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(BackendErrorKind::Unreachable.is_retryable());
        assert!(BackendErrorKind::Timeout.is_retryable());
        assert!(!BackendErrorKind::Rejected.is_retryable());
        assert!(!BackendErrorKind::NotFound.is_retryable());
    }

    #[test]
    fn test_cycle_message() {
        let err = ConfigurationError::Cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "dependency cycle between components: a -> b -> a");
    }

    #[test]
    fn test_kube_not_found_maps_to_not_found() {
        let err = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "namespaces \"x\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        });
        assert_eq!(BackendError::from(err).kind, BackendErrorKind::NotFound);
    }

    #[test]
    fn test_kube_forbidden_is_rejected() {
        let err = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        });
        let backend = BackendError::from(err);
        assert_eq!(backend.kind, BackendErrorKind::Rejected);
        assert!(!backend.is_retryable());
    }
}
