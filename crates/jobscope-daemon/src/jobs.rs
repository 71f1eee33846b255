//! The demo feed-sync job type.
//!
//! `FeedSyncJob` is constructed fresh for every firing: both of its
//! capability variants are resolved through the configuration's marketplace
//! selector, inside the activation's scope.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use jobscope_lifecycle::{JobBindings, JobError, Scope, ScopeError, ScopedJob};
use jobscope_types::{JobConfiguration, Marketplace};

use crate::feeds::{FeedBindings, FeedLabeler, UnitCounter};

/// Job-type name of the demo feed synchronization job.
pub const FEED_SYNC: &str = "feed-sync";

/// Configuration data key for the base unit count (default 5).
pub const BASE_UNITS_KEY: &str = "base_units";

const DEFAULT_BASE_UNITS: i64 = 5;

/// Synchronizes one marketplace feed using per-run capability variants.
pub struct FeedSyncJob {
    marketplace: Marketplace,
    base_units: i64,
    units: Box<dyn UnitCounter>,
    labeler: Box<dyn FeedLabeler>,
}

impl FeedSyncJob {
    /// Construct inside `scope`, selecting variants by the configuration's
    /// marketplace.
    pub fn create(
        scope: &mut Scope,
        configuration: &JobConfiguration,
        feeds: &FeedBindings,
    ) -> Result<Self, ScopeError> {
        let marketplace = configuration.marketplace();
        Ok(Self {
            marketplace,
            base_units: configuration.data_or(BASE_UNITS_KEY, DEFAULT_BASE_UNITS),
            units: feeds.unit_counters.build(marketplace, scope)?,
            labeler: feeds.labelers.build(marketplace, scope)?,
        })
    }
}

#[async_trait]
impl ScopedJob for FeedSyncJob {
    async fn run(&mut self) -> Result<(), JobError> {
        let units = self.units.count_units(self.base_units);
        let label = self.labeler.label(self.base_units);
        info!(
            marketplace = %self.marketplace,
            units,
            label = %label,
            "Feed sync complete"
        );
        Ok(())
    }
}

/// Build the process-wide job binding table over the feed capabilities.
/// Called once at startup; wrapped in `Arc` by the caller.
pub fn job_bindings(feeds: FeedBindings) -> JobBindings {
    let feeds = Arc::new(feeds);
    let mut jobs = JobBindings::new();
    jobs.bind(FEED_SYNC, move |scope, configuration| {
        Ok(Box::new(FeedSyncJob::create(scope, configuration, &feeds)?))
    });
    jobs
}
