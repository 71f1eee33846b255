//! Daemon configuration.
//!
//! Loaded in order, later sources overriding earlier:
//! 1. Built-in defaults
//! 2. Config file (TOML, via `--config`)
//! 3. CLI flags

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jobscope_scheduler::{Schedule, SchedulerConfig};
use jobscope_types::{JobConfiguration, Marketplace};

use crate::jobs::BASE_UNITS_KEY;

/// Errors from loading or validating the daemon configuration.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration is structurally valid but unusable
    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Scheduler service settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Marketplace the feed-sync job runs against.
    #[serde(default = "default_marketplace")]
    pub marketplace: Marketplace,

    /// Firing interval in seconds; ignored when `cron` is set.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Optional cron expression overriding the interval.
    #[serde(default)]
    pub cron: Option<String>,

    /// Base unit count handed to the job as trigger data.
    #[serde(default = "default_base_units")]
    pub base_units: i64,
}

fn default_marketplace() -> Marketplace {
    Marketplace::Jet
}

fn default_interval_secs() -> u64 {
    1
}

fn default_base_units() -> i64 {
    5
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            marketplace: default_marketplace(),
            interval_secs: default_interval_secs(),
            cron: None,
            base_units: default_base_units(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration, starting from defaults.
    ///
    /// With `path = None` the defaults are returned as-is; an explicitly
    /// named file must exist and parse.
    ///
    /// # Errors
    ///
    /// `DaemonError::Io` or `DaemonError::Parse` for an unreadable or
    /// malformed file.
    pub fn load(path: Option<&Path>) -> Result<Self, DaemonError> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| DaemonError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(toml::from_str(&raw)?)
            }
        }
    }

    /// Check the configuration for values the runtime would reject later.
    ///
    /// # Errors
    ///
    /// `DaemonError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), DaemonError> {
        if !self.marketplace.is_valid() {
            return Err(DaemonError::Invalid(
                "marketplace must be a real marketplace, not 'invalid'".to_string(),
            ));
        }
        if self.cron.is_none() && self.interval_secs == 0 {
            return Err(DaemonError::Invalid(
                "interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The trigger schedule this configuration describes.
    pub fn schedule(&self) -> Schedule {
        match &self.cron {
            Some(expr) => Schedule::cron(expr.clone()),
            None => Schedule::every_secs(self.interval_secs),
        }
    }

    /// The per-execution job configuration this daemon registers.
    pub fn job_configuration(&self) -> JobConfiguration {
        JobConfiguration::new(self.marketplace)
            .with_data(BASE_UNITS_KEY, self.base_units.to_string())
    }
}
