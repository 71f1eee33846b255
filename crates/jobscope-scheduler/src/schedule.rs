//! Trigger schedules for registered job types.
//!
//! A job type fires either on a cron expression (6-field, timezone-aware)
//! or on a fixed interval. Both forms are validated at registration time so
//! a wiring mistake surfaces before the scheduler starts.

use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio_cron_scheduler::Job;

use crate::{SchedulerConfig, SchedulerError};

/// Validate a cron expression.
///
/// The expression uses the 6-field format:
/// second minute hour day-of-month month day-of-week.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidCron` if the expression is not valid.
///
/// # Example
///
/// ```
/// use jobscope_scheduler::validate_cron_expression;
///
/// assert!(validate_cron_expression("0 0 * * * *").is_ok());  // Every hour
/// assert!(validate_cron_expression("invalid").is_err());
/// ```
pub fn validate_cron_expression(expr: &str) -> Result<(), SchedulerError> {
    // tokio-cron-scheduler parses on job creation, so a throwaway job is the
    // authoritative check.
    match Job::new_async(expr, |_uuid, _lock| Box::pin(async {})) {
        Ok(_) => Ok(()),
        Err(e) => Err(SchedulerError::InvalidCron(format!("'{}': {}", expr, e))),
    }
}

/// When a registered job type fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Cron expression with an optional IANA timezone; the scheduler's
    /// default timezone applies when none is named.
    Cron {
        expr: String,
        #[serde(default)]
        timezone: Option<String>,
    },

    /// Fixed interval; the first firing happens one interval after start.
    Every { secs: u64 },
}

impl Schedule {
    /// Cron schedule in the scheduler's default timezone.
    pub fn cron(expr: impl Into<String>) -> Self {
        Schedule::Cron {
            expr: expr.into(),
            timezone: None,
        }
    }

    /// Cron schedule in an explicit timezone.
    pub fn cron_tz(expr: impl Into<String>, timezone: impl Into<String>) -> Self {
        Schedule::Cron {
            expr: expr.into(),
            timezone: Some(timezone.into()),
        }
    }

    /// Fixed-interval schedule.
    pub fn every_secs(secs: u64) -> Self {
        Schedule::Every { secs }
    }

    /// Check the schedule against the scheduler configuration.
    ///
    /// # Errors
    ///
    /// `InvalidCron`, `InvalidTimezone` or `InvalidInterval` depending on
    /// which part is malformed.
    pub fn validate(&self, config: &SchedulerConfig) -> Result<(), SchedulerError> {
        match self {
            Schedule::Cron { expr, .. } => {
                validate_cron_expression(expr)?;
                self.resolve_timezone(config)?;
                Ok(())
            }
            Schedule::Every { secs } => {
                if *secs == 0 {
                    return Err(SchedulerError::InvalidInterval(
                        "interval must be at least one second".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// The timezone a cron schedule runs in. Intervals have no timezone.
    pub(crate) fn resolve_timezone(&self, config: &SchedulerConfig) -> Result<Tz, SchedulerError> {
        match self {
            Schedule::Cron {
                timezone: Some(tz), ..
            } => tz
                .parse()
                .map_err(|_| SchedulerError::InvalidTimezone(tz.clone())),
            _ => config.parse_timezone(),
        }
    }

}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Cron {
                expr,
                timezone: Some(tz),
            } => write!(f, "cron {} ({})", expr, tz),
            Schedule::Cron {
                expr,
                timezone: None,
            } => write!(f, "cron {}", expr),
            Schedule::Every { secs } => write!(f, "every {}s", secs),
        }
    }
}
