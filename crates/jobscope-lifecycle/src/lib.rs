//! # jobscope-lifecycle
//!
//! Scope-per-execution lifecycle management.
//!
//! Every job execution gets its own isolated set of dependencies: a `Scope`
//! is opened immediately before the job is constructed, every resource the
//! construction needs is created fresh inside it, and the whole scope is
//! released immediately after the job body finishes, on success and on
//! failure alike.
//!
//! The pieces, leaves first:
//!
//! - `resource`: the `ScopedResource` trait, a unit of scope-owned state
//!   with an explicit release hook
//! - `scope`: the `Scope` ownership context, which releases everything it
//!   owns in reverse-creation order, exactly once
//! - `bindings`: startup-built tables mapping (capability, selector) and
//!   job-type names to constructors
//! - `activation`: `JobActivator`/`JobDeactivator`, the begin/end hooks the
//!   scheduler invokes around each execution
//!
//! # Example
//!
//! ```ignore
//! let activator = JobActivator::new(bindings);
//! let mut active = activator.activate("feed-sync", &configuration)?;
//! let outcome = active.run().await;
//! JobDeactivator::deactivate(active)?;
//! ```

pub mod activation;
pub mod bindings;
pub mod error;
pub mod resource;
pub mod scope;

pub use activation::{ActiveJob, JobActivator, JobDeactivator, ScopedJob};
pub use bindings::{JobBindings, VariantBindings};
pub use error::{HookError, JobError, ReleaseError, ReleaseFailure, ScopeError};
pub use resource::{ResourceId, ScopedResource};
pub use scope::{Scope, ScopeId};
