//! Overlap handling for firings of the same job type.
//!
//! A trigger can fire again while the previous run is still executing. The
//! policy decides whether the new firing proceeds (each run still gets its
//! own scope) or is skipped and recorded as such.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Policy for firings that arrive while a previous run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Skip the firing when the previous run is still active (recommended
    /// for jobs that can outlast their interval).
    #[default]
    Skip,

    /// Let firings overlap. Every concurrent run still gets its own
    /// isolated scope; the resources are never shared.
    Concurrent,
}

/// In-flight counter for one registration, shared by all its firings.
#[derive(Clone, Default)]
pub(crate) struct OverlapState {
    in_flight: Arc<AtomicU32>,
}

impl OverlapState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Gate a firing by `policy`.
    ///
    /// Returns a permit when the firing should proceed, `None` when it
    /// should be skipped. The permit decrements the in-flight count on drop,
    /// so every exit path of the run (error paths included) releases it.
    pub(crate) fn try_begin(&self, policy: OverlapPolicy) -> Option<RunPermit> {
        match policy {
            OverlapPolicy::Skip => self
                .in_flight
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
                .then(|| RunPermit {
                    in_flight: self.in_flight.clone(),
                }),
            OverlapPolicy::Concurrent => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                Some(RunPermit {
                    in_flight: self.in_flight.clone(),
                })
            }
        }
    }

    pub(crate) fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// RAII permit for one run; releases its in-flight slot when dropped.
pub struct RunPermit {
    in_flight: Arc<AtomicU32>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
