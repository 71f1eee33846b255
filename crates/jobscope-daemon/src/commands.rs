//! Command implementations for the jobscope daemon.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use jobscope_lifecycle::{JobActivator, JobDeactivator};
use jobscope_scheduler::{OverlapPolicy, SchedulerService};

use crate::config::DaemonConfig;
use crate::feeds::feed_bindings;
use crate::jobs::{job_bindings, FEED_SYNC};

/// Build the process-wide activator from the startup bindings.
///
/// This is the one-time composition step: after it returns, the binding
/// tables are immutable for the life of the process.
fn build_activator() -> Arc<JobActivator> {
    Arc::new(JobActivator::new(Arc::new(job_bindings(feed_bindings()))))
}

/// Run the scheduler in the foreground until Ctrl-C.
pub async fn run(config: DaemonConfig) -> Result<()> {
    config.validate()?;
    let activator = build_activator();

    let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
    scheduler
        .register_scoped_job(
            FEED_SYNC,
            config.schedule(),
            config.job_configuration(),
            OverlapPolicy::Skip,
            activator,
        )
        .await?;

    scheduler.start().await?;
    info!(
        marketplace = %config.marketplace,
        schedule = %config.schedule(),
        "jobscope running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");

    let registry = scheduler.registry();
    scheduler.shutdown().await?;

    for stats in registry.all() {
        info!(
            job = %stats.job_type,
            runs = stats.runs,
            failures = stats.failures,
            skips = stats.skips,
            "Final run statistics"
        );
    }

    Ok(())
}

/// Validate configuration and bindings wiring without scheduling anything.
///
/// Performs one activate/deactivate round trip: every capability the job
/// needs is constructed and every resource released again, so a wiring
/// mistake surfaces here instead of on the first trigger.
pub fn validate(config: &DaemonConfig) -> Result<()> {
    config.validate()?;
    let activator = build_activator();

    let active = activator.activate(FEED_SYNC, &config.job_configuration())?;
    let resources = active.resource_count();
    JobDeactivator::deactivate(active)?;

    info!(
        marketplace = %config.marketplace,
        resources,
        "Wiring OK: activation round trip succeeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use jobscope_types::Marketplace;

    use super::*;

    #[test]
    fn test_validate_succeeds_with_defaults() {
        let config = DaemonConfig::default();
        validate(&config).unwrap();
    }

    #[test]
    fn test_validate_fails_for_invalid_marketplace() {
        let config = DaemonConfig {
            marketplace: Marketplace::Invalid,
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }
}
