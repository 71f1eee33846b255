//! Scheduler service driving scoped job executions.
//!
//! `SchedulerService` wraps `tokio-cron-scheduler` with lifecycle management
//! and owns the bridge between trigger firings and the lifecycle crate:
//! every firing of a registered job type is driven through
//! activate → execute → deactivate with its outcome recorded in the
//! `RunRegistry`. Nothing a firing does can error out of its closure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use jobscope_lifecycle::{JobActivator, JobDeactivator};
use jobscope_types::JobConfiguration;

use crate::overlap::OverlapState;
use crate::registry::{RunOutcome, RunRegistry};
use crate::{OverlapPolicy, Schedule, SchedulerConfig, SchedulerError};

/// Service wrapper around `JobScheduler` for lifecycle management.
///
/// Created stopped; `start()` begins firing, `shutdown()` cancels the
/// shutdown token, waits out the configured grace period and stops the
/// underlying scheduler.
pub struct SchedulerService {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    registry: Arc<RunRegistry>,
    shutdown_token: CancellationToken,
    is_running: AtomicBool,
}

impl SchedulerService {
    /// Create a new scheduler service with the given configuration.
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidTimezone` if the configured default timezone
    /// does not parse; scheduler construction errors otherwise.
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        // Surface timezone mistakes at construction, not first registration.
        let _ = config.parse_timezone()?;

        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            config,
            registry: Arc::new(RunRegistry::new()),
            shutdown_token: CancellationToken::new(),
            is_running: AtomicBool::new(false),
        })
    }

    /// Run statistics shared with the trigger closures.
    pub fn registry(&self) -> Arc<RunRegistry> {
        self.registry.clone()
    }

    /// Clone of the shutdown token, for long job bodies that want to stop
    /// early on shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start firing registered schedules.
    ///
    /// # Errors
    ///
    /// `SchedulerError::AlreadyRunning` if already started.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.scheduler.start().await?;
        info!("Scheduler started");

        Ok(())
    }

    /// Shut down gracefully.
    ///
    /// Cancels the shutdown token, waits the configured grace period for
    /// in-flight runs, then stops the underlying scheduler.
    ///
    /// # Errors
    ///
    /// `SchedulerError::NotRunning` if the scheduler was never started.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.shutdown_token.cancel();

        tokio::time::sleep(std::time::Duration::from_secs(self.config.shutdown_grace_secs)).await;

        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");

        Ok(())
    }

    /// Register a job type whose every firing gets a fresh scope.
    ///
    /// The configuration is copied into each execution; the activator is the
    /// lifecycle bridge built by the composition root. Returns the handle of
    /// the installed trigger.
    ///
    /// # Errors
    ///
    /// Schedule validation errors (`InvalidCron`, `InvalidInterval`,
    /// `InvalidTimezone`) or an error from the underlying scheduler.
    pub async fn register_scoped_job(
        &self,
        job_type: &str,
        schedule: Schedule,
        configuration: JobConfiguration,
        overlap: OverlapPolicy,
        activator: Arc<JobActivator>,
    ) -> Result<uuid::Uuid, SchedulerError> {
        schedule.validate(&self.config)?;
        self.registry.register(job_type, &schedule.to_string());

        let ctx = FiringContext {
            job_type: Arc::from(job_type),
            configuration,
            activator,
            registry: self.registry.clone(),
            policy: overlap,
            overlap: OverlapState::new(),
        };

        let job = match &schedule {
            Schedule::Every { secs } => {
                Job::new_repeated_async(std::time::Duration::from_secs(*secs), move |_uuid, _lock| {
                    let ctx = ctx.clone();
                    Box::pin(async move { ctx.fire().await })
                })
                .map_err(|e| SchedulerError::Scheduler(e.to_string()))?
            }
            Schedule::Cron { expr, .. } => {
                let tz = schedule.resolve_timezone(&self.config)?;
                Job::new_async_tz(expr.as_str(), tz, move |_uuid, _lock| {
                    let ctx = ctx.clone();
                    Box::pin(async move { ctx.fire().await })
                })
                .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?
            }
        };

        let uuid = self.scheduler.add(job).await?;
        info!(
            job_type,
            trigger = %uuid,
            schedule = %schedule,
            policy = ?overlap,
            "Scoped job registered"
        );

        Ok(uuid)
    }
}

/// Everything one firing needs, cloned into each trigger invocation.
#[derive(Clone)]
struct FiringContext {
    job_type: Arc<str>,
    configuration: JobConfiguration,
    activator: Arc<JobActivator>,
    registry: Arc<RunRegistry>,
    policy: OverlapPolicy,
    overlap: OverlapState,
}

impl FiringContext {
    /// Drive one firing through the activation state machine.
    ///
    /// Triggered → Activating → Executing → Deactivating → Completed, with
    /// the Activating → Failed shortcut when construction fails. Cleanup is
    /// unconditional; the outcome always lands in the registry.
    async fn fire(self) {
        let Some(_permit) = self.overlap.try_begin(self.policy) else {
            debug!(job = %self.job_type, "Previous run still in flight; firing skipped");
            self.registry.record_skip(&self.job_type);
            return;
        };

        self.registry.record_start(&self.job_type);
        debug!(job = %self.job_type, "Run started");
        let started = Instant::now();

        let outcome = match self.activator.activate(&self.job_type, &self.configuration) {
            Ok(mut active) => {
                let body = active.run().await;
                if let Err(release_err) = JobDeactivator::deactivate(active) {
                    error!(
                        job = %self.job_type,
                        error = %release_err,
                        "Release hooks failed after run; all other resources were released"
                    );
                    self.registry.record_release_failure(&self.job_type);
                }
                match body {
                    Ok(()) => RunOutcome::Success,
                    Err(err) => RunOutcome::Failed(err.to_string()),
                }
            }
            Err(err) => {
                // The activator already rolled the partial scope back.
                warn!(
                    job = %self.job_type,
                    error = %err,
                    retriable = err.is_retriable(),
                    "Activation failed; job body not executed"
                );
                RunOutcome::ActivationFailed(err.to_string())
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            job = %self.job_type,
            duration_ms,
            outcome = ?outcome,
            "Run finished"
        );
        self.registry.record_outcome(&self.job_type, outcome, duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;

    use jobscope_lifecycle::{
        HookError, JobBindings, JobError, ResourceId, ScopeError, ScopedJob, ScopedResource,
    };
    use jobscope_types::Marketplace;

    use super::*;

    /// Creation/release counters observable from outside the scopes.
    #[derive(Default)]
    struct Ledger {
        created: AtomicU32,
        released: AtomicU32,
    }

    struct LedgerResource {
        id: ResourceId,
        ledger: Arc<Ledger>,
    }

    impl LedgerResource {
        fn open(ledger: Arc<Ledger>) -> Self {
            ledger.created.fetch_add(1, Ordering::SeqCst);
            Self {
                id: ResourceId::generate(),
                ledger,
            }
        }
    }

    impl ScopedResource for LedgerResource {
        fn id(&self) -> ResourceId {
            self.id
        }

        fn kind(&self) -> &str {
            "ledger"
        }

        fn release(&self) -> Result<(), HookError> {
            self.ledger.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoopJob;

    #[async_trait]
    impl ScopedJob for NoopJob {
        async fn run(&mut self) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn ledgered_activator(ledger: Arc<Ledger>) -> Arc<JobActivator> {
        let mut jobs = JobBindings::new();
        jobs.bind("probe", move |scope, _| {
            scope.adopt(Arc::new(LedgerResource::open(ledger.clone())));
            Ok(Box::new(NoopJob))
        });
        Arc::new(JobActivator::new(Arc::new(jobs)))
    }

    fn failing_activator() -> Arc<JobActivator> {
        let mut jobs = JobBindings::new();
        jobs.bind("probe", |_, _| {
            Err(ScopeError::construction("probe", "creation hook failed"))
        });
        Arc::new(JobActivator::new(Arc::new(jobs)))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_new_is_stopped() {
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_timezone_config_rejected() {
        let config = SchedulerConfig {
            default_timezone: "Not/AZone".to_string(),
            ..Default::default()
        };
        let result = SchedulerService::new(config).await;
        assert!(matches!(result, Err(SchedulerError::InvalidTimezone(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_stop_lifecycle() {
        let config = SchedulerConfig {
            shutdown_grace_secs: 0,
            ..Default::default()
        };
        let mut scheduler = SchedulerService::new(config).await.unwrap();

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());
        assert!(matches!(
            scheduler.start().await,
            Err(SchedulerError::AlreadyRunning)
        ));

        scheduler.shutdown().await.unwrap();
        assert!(!scheduler.is_running());
        assert!(matches!(
            scheduler.shutdown().await,
            Err(SchedulerError::NotRunning)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_cancels_token() {
        let config = SchedulerConfig {
            shutdown_grace_secs: 0,
            ..Default::default()
        };
        let mut scheduler = SchedulerService::new(config).await.unwrap();
        let token = scheduler.shutdown_token();
        assert!(!token.is_cancelled());

        scheduler.start().await.unwrap();
        scheduler.shutdown().await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_register_rejects_invalid_schedules() {
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();
        let activator = ledgered_activator(Arc::new(Ledger::default()));

        let result = scheduler
            .register_scoped_job(
                "probe",
                Schedule::cron("not-a-cron"),
                JobConfiguration::new(Marketplace::Jet),
                OverlapPolicy::Skip,
                activator.clone(),
            )
            .await;
        assert!(matches!(result, Err(SchedulerError::InvalidCron(_))));

        let result = scheduler
            .register_scoped_job(
                "probe",
                Schedule::every_secs(0),
                JobConfiguration::new(Marketplace::Jet),
                OverlapPolicy::Skip,
                activator,
            )
            .await;
        assert!(matches!(result, Err(SchedulerError::InvalidInterval(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fired_runs_never_leak_resources() {
        let ledger = Arc::new(Ledger::default());
        let config = SchedulerConfig {
            shutdown_grace_secs: 1,
            ..Default::default()
        };
        let mut scheduler = SchedulerService::new(config).await.unwrap();

        scheduler
            .register_scoped_job(
                "probe",
                Schedule::every_secs(1),
                JobConfiguration::new(Marketplace::Jet),
                OverlapPolicy::Skip,
                ledgered_activator(ledger.clone()),
            )
            .await
            .unwrap();

        scheduler.start().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        scheduler.shutdown().await.unwrap();

        // However many firings happened, every created resource was released.
        let created = ledger.created.load(Ordering::SeqCst);
        let released = ledger.released.load(Ordering::SeqCst);
        assert_eq!(created, released);

        let stats = scheduler.registry().stats("probe").unwrap();
        assert_eq!(stats.runs as u32, created);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_activation_failure_is_recorded_not_fatal() {
        let config = SchedulerConfig {
            shutdown_grace_secs: 1,
            ..Default::default()
        };
        let mut scheduler = SchedulerService::new(config).await.unwrap();

        scheduler
            .register_scoped_job(
                "probe",
                Schedule::every_secs(1),
                JobConfiguration::new(Marketplace::Jet),
                OverlapPolicy::Skip,
                failing_activator(),
            )
            .await
            .unwrap();

        scheduler.start().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        scheduler.shutdown().await.unwrap();

        let stats = scheduler.registry().stats("probe").unwrap();
        // Every firing that ran ended in a recorded activation failure.
        assert_eq!(stats.runs, stats.failures);
        assert_eq!(stats.in_flight, 0);
        if let Some(outcome) = stats.last_outcome {
            assert!(matches!(outcome, RunOutcome::ActivationFailed(_)));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_direct_fire_records_success() {
        // Exercise the firing state machine without waiting on real triggers.
        let ledger = Arc::new(Ledger::default());
        let registry = Arc::new(RunRegistry::new());
        registry.register("probe", "every 1s");

        let ctx = FiringContext {
            job_type: Arc::from("probe"),
            configuration: JobConfiguration::new(Marketplace::Jet),
            activator: ledgered_activator(ledger.clone()),
            registry: registry.clone(),
            policy: OverlapPolicy::Skip,
            overlap: OverlapState::new(),
        };

        ctx.clone().fire().await;
        ctx.fire().await;

        assert_eq!(ledger.created.load(Ordering::SeqCst), 2);
        assert_eq!(ledger.released.load(Ordering::SeqCst), 2);
        let stats = registry.stats("probe").unwrap();
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.last_outcome, Some(RunOutcome::Success));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_direct_fire_records_job_failure_and_cleans_up() {
        struct FailingJob;

        #[async_trait]
        impl ScopedJob for FailingJob {
            async fn run(&mut self) -> Result<(), JobError> {
                Err(JobError::new("body failed"))
            }
        }

        let ledger = Arc::new(Ledger::default());
        let mut jobs = JobBindings::new();
        let hook_ledger = ledger.clone();
        jobs.bind("probe", move |scope, _| {
            scope.adopt(Arc::new(LedgerResource::open(hook_ledger.clone())));
            Ok(Box::new(FailingJob))
        });

        let registry = Arc::new(RunRegistry::new());
        registry.register("probe", "every 1s");

        let ctx = FiringContext {
            job_type: Arc::from("probe"),
            configuration: JobConfiguration::new(Marketplace::Jet),
            activator: Arc::new(JobActivator::new(Arc::new(jobs))),
            registry: registry.clone(),
            policy: OverlapPolicy::Skip,
            overlap: OverlapState::new(),
        };
        ctx.fire().await;

        // Body failed, but the scope was still released.
        assert_eq!(ledger.created.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.released.load(Ordering::SeqCst), 1);
        let stats = registry.stats("probe").unwrap();
        assert_eq!(stats.failures, 1);
        assert!(matches!(stats.last_outcome, Some(RunOutcome::Failed(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_direct_fire_skips_when_in_flight() {
        let ledger = Arc::new(Ledger::default());
        let registry = Arc::new(RunRegistry::new());
        registry.register("probe", "every 1s");

        let ctx = FiringContext {
            job_type: Arc::from("probe"),
            configuration: JobConfiguration::new(Marketplace::Jet),
            activator: ledgered_activator(ledger),
            registry: registry.clone(),
            policy: OverlapPolicy::Skip,
            overlap: OverlapState::new(),
        };

        // Hold a permit as if a previous run were still executing.
        let permit = ctx.overlap.try_begin(OverlapPolicy::Skip).unwrap();
        ctx.clone().fire().await;
        drop(permit);

        let stats = registry.stats("probe").unwrap();
        assert_eq!(stats.skips, 1);
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.last_outcome, Some(RunOutcome::Skipped));
    }
}
