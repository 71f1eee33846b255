//! Activation and deactivation around each job execution.
//!
//! The scheduler calls `JobActivator::activate` once per trigger firing and
//! `JobDeactivator::deactivate` once per successful activation, after the
//! job body returns or errors. Activation opens a fresh scope, resolves the
//! job inside it, and returns the job bundled with its owning scope; if
//! resolution fails partway, the partial scope is released before the error
//! propagates, so a failed activation never leaks.
//!
//! Deactivation consumes the `ActiveJob`: the job instance is dropped before
//! its resources are released, so a job cannot outlive its scope.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use jobscope_types::JobConfiguration;

use crate::bindings::JobBindings;
use crate::error::{JobError, ReleaseError, ScopeError};
use crate::scope::{Scope, ScopeId};

/// A unit of work constructed inside a scope.
///
/// Implementations hold the capability variants resolved for them at
/// activation time; they exist only between activation and deactivation.
#[async_trait]
pub trait ScopedJob: Send {
    /// Execute the job body. May suspend; resource hooks never do.
    async fn run(&mut self) -> Result<(), JobError>;
}

impl std::fmt::Debug for dyn ScopedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScopedJob")
    }
}

/// A constructed job bundled with the scope that owns its resources.
///
/// One value per execution. The scheduler runs the body via [`ActiveJob::run`]
/// and then hands the whole value to [`JobDeactivator::deactivate`].
pub struct ActiveJob {
    job: Box<dyn ScopedJob>,
    scope: Scope,
}

impl ActiveJob {
    /// Identifier of the owning scope.
    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    /// Number of resources created during activation.
    pub fn resource_count(&self) -> usize {
        self.scope.resource_count()
    }

    /// Execute the job body.
    pub async fn run(&mut self) -> Result<(), JobError> {
        self.job.run().await
    }
}

impl std::fmt::Debug for ActiveJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveJob")
            .field("scope_id", &self.scope.id())
            .field("resource_count", &self.scope.resource_count())
            .finish()
    }
}

/// Opens a scope and constructs a job inside it, once per trigger firing.
pub struct JobActivator {
    bindings: Arc<JobBindings>,
}

impl JobActivator {
    /// Create an activator over a finished binding table.
    pub fn new(bindings: Arc<JobBindings>) -> Self {
        Self { bindings }
    }

    /// The binding table this activator resolves against.
    pub fn bindings(&self) -> &JobBindings {
        &self.bindings
    }

    /// Open a fresh scope and construct `job_type` inside it.
    ///
    /// Resource creation hooks are the only externally observable effect.
    ///
    /// # Errors
    ///
    /// Any `ScopeError` from resolution. On error the partially built scope
    /// has already been released: the caller must not execute a job body
    /// and has nothing to clean up.
    pub fn activate(
        &self,
        job_type: &str,
        configuration: &JobConfiguration,
    ) -> Result<ActiveJob, ScopeError> {
        let mut scope = Scope::open();
        match self.bindings.construct(job_type, &mut scope, configuration) {
            Ok(job) => {
                debug!(
                    scope = %scope.id(),
                    job_type,
                    resources = scope.resource_count(),
                    "Job activated"
                );
                Ok(ActiveJob { job, scope })
            }
            Err(err) => {
                // Roll back whatever was created before the failure.
                if let Err(release_err) = scope.release() {
                    error!(
                        scope = %scope.id(),
                        job_type,
                        error = %release_err,
                        "Release hooks failed while rolling back a failed activation"
                    );
                }
                Err(err)
            }
        }
    }
}

/// Releases the scope of a finished execution.
pub struct JobDeactivator;

impl JobDeactivator {
    /// Consume the execution and release its scope.
    ///
    /// The job instance is dropped first, then every resource is released in
    /// reverse-creation order. Invoked on every exit path of a successful
    /// activation, job-body failure included. After this returns, no
    /// resource created during the execution remains live.
    ///
    /// # Errors
    ///
    /// `ReleaseError` aggregating any failed release hooks; all hooks have
    /// run regardless.
    pub fn deactivate(active: ActiveJob) -> Result<(), ReleaseError> {
        let ActiveJob { job, mut scope } = active;
        drop(job);
        let result = scope.release();
        debug!(scope = %scope.id(), ok = result.is_ok(), "Job deactivated");
        result
    }
}
