//! Cached last-known observation shared between a probe's signal handler and
//! the engine.

use crate::error::ProbeError;
use crate::observation::{Observation, Reading};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Holds one probe's latest observation and applies the failure policy.
///
/// - `Ok(reading)` replaces the observation
/// - `TransientRead` keeps the last good observation
/// - `Unavailable` pins the observation to `Unknown` until [`reset`](Self::reset)
#[derive(Debug)]
pub struct ObservationCell {
    source_id: String,
    current: RwLock<Observation>,
    unavailable: AtomicBool,
}

impl ObservationCell {
    pub fn new(source_id: impl Into<String>) -> Self {
        let source_id = source_id.into();
        Self {
            current: RwLock::new(Observation::unknown(source_id.clone())),
            source_id,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Snapshot of the cached observation.
    pub fn get(&self) -> Observation {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::SeqCst)
    }

    /// Apply a sample result. Returns `true` when the activity or hint changed.
    pub fn record(&self, sample: Result<Reading, ProbeError>) -> bool {
        if self.is_unavailable() {
            return false;
        }

        match sample {
            Ok(reading) => self.replace(reading),
            Err(ProbeError::TransientRead(reason)) => {
                tracing::debug!(probe = %self.source_id, %reason, "sample_failed_keeping_last");
                false
            }
            Err(ProbeError::Unavailable(reason)) => {
                tracing::warn!(probe = %self.source_id, %reason, "probe_unavailable");
                self.unavailable.store(true, Ordering::SeqCst);
                self.replace(Reading::UNKNOWN)
            }
        }
    }

    /// Mark the probe as permanently unable to observe anything.
    pub fn mark_unavailable(&self, reason: impl Into<String>) -> bool {
        self.record(Err(ProbeError::Unavailable(reason.into())))
    }

    /// Forget everything, including a previous `Unavailable` verdict.
    pub fn reset(&self) {
        self.unavailable.store(false, Ordering::SeqCst);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Observation::unknown(self.source_id.clone());
    }

    fn replace(&self, reading: Reading) -> bool {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let changed = guard.reading() != reading;
        *guard = Observation::new(self.source_id.clone(), reading);
        drop(guard);

        if changed {
            tracing::debug!(
                probe = %self.source_id,
                activity = ?reading.activity,
                hint = ?reading.hint,
                "observation_changed"
            );
        }
        changed
    }
}
