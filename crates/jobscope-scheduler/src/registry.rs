//! Run bookkeeping for scheduled job types.
//!
//! The `RunRegistry` tracks, per registered job type, what the last firing
//! did and how often firings have run, failed, or been skipped. It is shared
//! between the trigger closures and whoever wants to observe the scheduler
//! (the daemon prints it on shutdown).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal outcome of one firing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunOutcome {
    /// Job body completed.
    Success,
    /// Job body returned an error.
    Failed(String),
    /// Activation failed; no job body ran and the partial scope was rolled
    /// back.
    ActivationFailed(String),
    /// Firing skipped because a previous run was still in flight.
    Skipped,
}

impl RunOutcome {
    /// Whether this outcome counts as a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_) | RunOutcome::ActivationFailed(_))
    }
}

/// Accumulated statistics for one registered job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Registered job-type name.
    pub job_type: String,
    /// Rendered schedule, for display.
    pub schedule: String,
    /// When the last run started (if any ever did).
    pub last_started: Option<DateTime<Utc>>,
    /// Duration of the last completed run in milliseconds.
    pub last_duration_ms: Option<u64>,
    /// Outcome of the last firing (including skips).
    pub last_outcome: Option<RunOutcome>,
    /// Completed runs (success or failure; skips not included).
    pub runs: u64,
    /// Failed runs, activation failures included.
    pub failures: u64,
    /// Firings skipped by the overlap policy.
    pub skips: u64,
    /// Runs whose scope release reported hook failures.
    pub release_failures: u64,
    /// Executions currently in flight.
    pub in_flight: u32,
}

impl RunStats {
    fn new(job_type: String, schedule: String) -> Self {
        Self {
            job_type,
            schedule,
            last_started: None,
            last_duration_ms: None,
            last_outcome: None,
            runs: 0,
            failures: 0,
            skips: 0,
            release_failures: 0,
            in_flight: 0,
        }
    }
}

/// Thread-safe per-job-type run statistics.
///
/// Recording methods tolerate unknown job types (they do nothing), so a
/// racing deregistration can never panic a trigger closure.
#[derive(Default)]
pub struct RunRegistry {
    stats: RwLock<HashMap<String, RunStats>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job type. Re-registration resets its statistics.
    pub fn register(&self, job_type: &str, schedule: &str) {
        let mut stats = self.stats.write().unwrap();
        stats.insert(
            job_type.to_string(),
            RunStats::new(job_type.to_string(), schedule.to_string()),
        );
    }

    /// Record that a firing passed the overlap gate and started.
    pub fn record_start(&self, job_type: &str) {
        let mut stats = self.stats.write().unwrap();
        if let Some(entry) = stats.get_mut(job_type) {
            entry.in_flight += 1;
            entry.last_started = Some(Utc::now());
        }
    }

    /// Record the terminal outcome of a started firing.
    pub fn record_outcome(&self, job_type: &str, outcome: RunOutcome, duration_ms: u64) {
        let mut stats = self.stats.write().unwrap();
        if let Some(entry) = stats.get_mut(job_type) {
            entry.in_flight = entry.in_flight.saturating_sub(1);
            entry.runs += 1;
            if outcome.is_failure() {
                entry.failures += 1;
            }
            entry.last_duration_ms = Some(duration_ms);
            entry.last_outcome = Some(outcome);
        }
    }

    /// Record a firing skipped by the overlap policy.
    pub fn record_skip(&self, job_type: &str) {
        let mut stats = self.stats.write().unwrap();
        if let Some(entry) = stats.get_mut(job_type) {
            entry.skips += 1;
            entry.last_outcome = Some(RunOutcome::Skipped);
        }
    }

    /// Record that a run's scope release reported hook failures.
    pub fn record_release_failure(&self, job_type: &str) {
        let mut stats = self.stats.write().unwrap();
        if let Some(entry) = stats.get_mut(job_type) {
            entry.release_failures += 1;
        }
    }

    /// Statistics for one job type, if registered.
    pub fn stats(&self, job_type: &str) -> Option<RunStats> {
        self.stats.read().unwrap().get(job_type).cloned()
    }

    /// Statistics for every registered job type.
    pub fn all(&self) -> Vec<RunStats> {
        self.stats.read().unwrap().values().cloned().collect()
    }

    /// Executions of a job type currently in flight.
    pub fn in_flight(&self, job_type: &str) -> u32 {
        self.stats
            .read()
            .unwrap()
            .get(job_type)
            .map(|s| s.in_flight)
            .unwrap_or(0)
    }

    /// Number of registered job types.
    pub fn len(&self) -> usize {
        self.stats.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.read().unwrap().is_empty()
    }
}
