//! Error types for the lifecycle crate.
//!
//! The taxonomy separates construction-time failures (`ScopeError`) from
//! teardown failures (`ReleaseError`). Construction failures abort only the
//! current activation; release failures are collected during cleanup and
//! reported once every hook has run.

use thiserror::Error;

use jobscope_types::Marketplace;

use crate::resource::ResourceId;

/// Errors that can occur while resolving a job inside a scope.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// No constructor registered for the requested capability/selector pair.
    ///
    /// Signals a wiring defect; retrying without rebinding cannot succeed.
    #[error("No variant bound for capability '{capability}' and selector '{selector}'")]
    UnboundVariant {
        capability: &'static str,
        selector: Marketplace,
    },

    /// No constructor registered for the requested job type.
    #[error("Job type not registered: {0}")]
    UnknownJobType(String),

    /// A resource creation hook or job constructor failed during resolution.
    ///
    /// The partially built scope is rolled back before this propagates, so
    /// the scheduler may retry on the next trigger.
    #[error("Construction of '{context}' failed: {message}")]
    Construction { context: String, message: String },
}

impl ScopeError {
    /// Build a `Construction` error from a failing hook.
    pub fn construction(context: impl Into<String>, message: impl ToString) -> Self {
        ScopeError::Construction {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether the scheduler may reasonably retry on the next trigger.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ScopeError::Construction { .. })
    }
}

/// Error returned by a resource creation or release hook.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// One failed release hook, recorded while the remaining hooks still run.
#[derive(Debug, Clone)]
pub struct ReleaseFailure {
    /// Resource whose hook failed.
    pub resource: ResourceId,
    /// Resource kind, for diagnostics.
    pub kind: String,
    /// What the hook reported.
    pub message: String,
}

/// Aggregate failure from releasing a scope.
///
/// Every owned resource's hook has been invoked by the time this is
/// returned; the failures here never prevented the remaining releases.
#[derive(Debug, Error)]
#[error("{} release hook(s) failed", .failures.len())]
pub struct ReleaseError {
    pub failures: Vec<ReleaseFailure>,
}

/// Error returned by a job body.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct JobError(pub String);

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for JobError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_variant_display() {
        let err = ScopeError::UnboundVariant {
            capability: "unit-counter",
            selector: Marketplace::Jet,
        };
        let message = err.to_string();
        assert!(message.contains("unit-counter"));
        assert!(message.contains("jet"));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_construction_is_retriable() {
        let err = ScopeError::construction("feed-connection", "connection refused");
        assert!(err.is_retriable());
        assert!(err.to_string().contains("feed-connection"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_unknown_job_type_display() {
        let err = ScopeError::UnknownJobType("nope".to_string());
        assert!(err.to_string().contains("nope"));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_release_error_counts_failures() {
        let err = ReleaseError {
            failures: vec![
                ReleaseFailure {
                    resource: ResourceId::generate(),
                    kind: "probe".to_string(),
                    message: "boom".to_string(),
                },
                ReleaseFailure {
                    resource: ResourceId::generate(),
                    kind: "probe".to_string(),
                    message: "boom again".to_string(),
                },
            ],
        };
        assert!(err.to_string().contains('2'));
    }
}
