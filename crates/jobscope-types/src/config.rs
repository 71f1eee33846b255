//! Per-registration job configuration.
//!
//! A `JobConfiguration` is built once when a job type is registered with the
//! scheduler and a copy is handed to every activation. It is never mutated
//! after construction: the builder methods consume `self`, and the fields are
//! only reachable through read accessors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::selector::Marketplace;

/// Immutable parameters for one job execution.
///
/// Carries the marketplace selector plus any trigger-supplied key/value data
/// the job constructor wants to read.
///
/// # Example
///
/// ```rust
/// use jobscope_types::{JobConfiguration, Marketplace};
///
/// let config = JobConfiguration::new(Marketplace::Amazon)
///     .with_data("base_units", "10");
///
/// assert_eq!(config.marketplace(), Marketplace::Amazon);
/// assert_eq!(config.data("base_units"), Some("10"));
/// assert_eq!(config.data("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfiguration {
    marketplace: Marketplace,
    #[serde(default)]
    data: HashMap<String, String>,
}

impl JobConfiguration {
    /// Create a configuration for the given marketplace with no extra data.
    pub fn new(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            data: HashMap::new(),
        }
    }

    /// Add a trigger-supplied data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The selector this execution is parameterized with.
    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    /// Look up a trigger-supplied data entry.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Parse a data entry, falling back to `default` when absent or malformed.
    pub fn data_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.data(key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }
}
