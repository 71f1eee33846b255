//! Recurring trigger service for jobscope.
//!
//! Wraps `tokio-cron-scheduler` with timezone support and graceful shutdown,
//! and drives every firing of a registered job type through the
//! scope-per-execution state machine:
//!
//! `Triggered → Activating → Executing → Deactivating → Completed`,
//! with the shortcut `Activating → Failed` when construction fails. Cleanup
//! happens on every path, so no firing can leak a scope.
//!
//! # Example
//!
//! ```ignore
//! use jobscope_scheduler::{OverlapPolicy, Schedule, SchedulerConfig, SchedulerService};
//!
//! let mut scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//! scheduler
//!     .register_scoped_job(
//!         "feed-sync",
//!         Schedule::every_secs(1),
//!         JobConfiguration::new(Marketplace::Jet),
//!         OverlapPolicy::Skip,
//!         activator,
//!     )
//!     .await?;
//! scheduler.start().await?;
//! // ...
//! scheduler.shutdown().await?;
//! ```

mod config;
mod error;
mod overlap;
mod registry;
mod schedule;
mod service;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use overlap::{OverlapPolicy, RunPermit};
pub use registry::{RunOutcome, RunRegistry, RunStats};
pub use schedule::{validate_cron_expression, Schedule};
pub use service::SchedulerService;
