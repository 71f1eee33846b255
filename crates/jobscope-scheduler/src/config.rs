//! Scheduler service configuration.

use serde::{Deserialize, Serialize};

use crate::SchedulerError;

/// Configuration for the scheduler service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Default timezone for cron schedules that do not name their own
    /// (IANA string, e.g. "America/New_York"). Defaults to "UTC".
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Seconds to wait for in-flight runs after the shutdown signal before
    /// stopping the underlying scheduler. Defaults to 2.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_shutdown_grace() -> u64 {
    2
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl SchedulerConfig {
    /// Parse the configured default timezone.
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidTimezone` if the string is not a valid IANA
    /// timezone identifier.
    pub fn parse_timezone(&self) -> Result<chrono_tz::Tz, SchedulerError> {
        self.default_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| SchedulerError::InvalidTimezone(self.default_timezone.clone()))
    }
}
