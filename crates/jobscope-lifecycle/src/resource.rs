//! Scope-owned resources.
//!
//! A resource is a unit of work-scoped state with an explicit release hook:
//! a per-run connection, a temp handle, anything the job needs opened for
//! exactly one execution. Resources are created by variant and job
//! constructors inside a `Scope` and must never be shared across scopes.

use std::fmt;

use ulid::Ulid;

use crate::error::HookError;

/// Identifier assigned to a resource when it is created.
///
/// ULID-backed, so ids sort by creation time and two concurrent executions
/// can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Ulid);

impl ResourceId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res-{}", self.0)
    }
}

/// A unit of scoped state with an explicit release hook.
///
/// Creation is the constructor itself (typically a `new`/`open` associated
/// function returning `Result<Self, HookError>`); release is invoked by the
/// owning scope, exactly once, in reverse-creation order. Hooks may block;
/// the scope holds no lock while invoking them.
pub trait ScopedResource: Send + Sync {
    /// Identifier assigned at creation time.
    fn id(&self) -> ResourceId;

    /// Short human-readable kind for logs and release diagnostics.
    fn kind(&self) -> &str;

    /// Release hook. Called once by the owning scope; a returned error is
    /// collected into the scope's `ReleaseError` without stopping the
    /// remaining releases.
    fn release(&self) -> Result<(), HookError>;
}
