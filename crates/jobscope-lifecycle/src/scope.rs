//! Isolated construction and ownership context for one job execution.
//!
//! A `Scope` owns every resource created during one activation, in creation
//! order. Releasing the scope runs each resource's release hook in reverse
//! order, exactly once; a hook failure is recorded and the remaining hooks
//! still run. Dropping an unreleased scope releases it, so a cancelled or
//! abandoned activation cannot leak.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{ReleaseError, ReleaseFailure};
use crate::resource::ScopedResource;

/// Identifier for a scope; one is minted per activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(Ulid);

impl ScopeId {
    fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// Ownership context for the resources of a single execution.
///
/// Accessed by exactly one execution task for its entire life; nothing in
/// here is shared across executions.
pub struct Scope {
    id: ScopeId,
    resources: Vec<Arc<dyn ScopedResource>>,
    released: bool,
}

impl Scope {
    /// Open a new, empty scope. Never fails by itself; failures happen
    /// during resolution inside it.
    pub fn open() -> Self {
        let id = ScopeId::generate();
        debug!(scope = %id, "Scope opened");
        Self {
            id,
            resources: Vec::new(),
            released: false,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Transfer ownership of a freshly created resource into this scope.
    ///
    /// Returns a handle to the same resource so the constructor can keep
    /// using it. The scope records creation order and will invoke the
    /// release hook during `release()`.
    pub fn adopt<R>(&mut self, resource: Arc<R>) -> Arc<R>
    where
        R: ScopedResource + 'static,
    {
        debug!(
            scope = %self.id,
            resource = %resource.id(),
            kind = resource.kind(),
            "Resource adopted"
        );
        self.resources.push(resource.clone());
        resource
    }

    /// Number of live resources this scope owns.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release every owned resource in reverse-creation order, then mark the
    /// scope released.
    ///
    /// Idempotent: calling this on an already-released scope is a no-op.
    /// Every hook runs even if an earlier one fails; failures are collected
    /// into a single `ReleaseError` returned once cleanup completes.
    pub fn release(&mut self) -> Result<(), ReleaseError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut failures = Vec::new();
        while let Some(resource) = self.resources.pop() {
            if let Err(err) = resource.release() {
                warn!(
                    scope = %self.id,
                    resource = %resource.id(),
                    kind = resource.kind(),
                    error = %err,
                    "Release hook failed"
                );
                failures.push(ReleaseFailure {
                    resource: resource.id(),
                    kind: resource.kind().to_string(),
                    message: err.to_string(),
                });
            }
        }

        if failures.is_empty() {
            debug!(scope = %self.id, "Scope released");
            Ok(())
        } else {
            Err(ReleaseError { failures })
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Rollback path for activations that were never deactivated
        // (cancellation before execution). Failures are logged, not raised.
        if !self.released {
            if let Err(err) = self.release() {
                warn!(scope = %self.id, error = %err, "Scope dropped with failing release hooks");
            }
        }
    }
}
