//! Cache plus change notification for push-driven probes.

use crate::cell::ObservationCell;
use crate::error::ProbeError;
use crate::observation::{Observation, Reading};
use crate::ProbeCallback;
use std::sync::{Mutex, PoisonError};

/// An [`ObservationCell`] with an attachable change callback.
///
/// Notification happens while the callback slot is locked, so once
/// [`detach`](Self::detach) returns no callback is running or will run.
pub struct PushCell {
    cell: ObservationCell,
    on_change: Mutex<Option<ProbeCallback>>,
}

impl std::fmt::Debug for PushCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushCell")
            .field("cell", &self.cell)
            .field("attached", &self.on_change.try_lock().map(|slot| slot.is_some()).ok())
            .finish()
    }
}

impl PushCell {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            cell: ObservationCell::new(source_id),
            on_change: Mutex::new(None),
        }
    }

    pub fn source_id(&self) -> &str {
        self.cell.source_id()
    }

    pub fn observation(&self) -> Observation {
        self.cell.get()
    }

    pub fn cell(&self) -> &ObservationCell {
        &self.cell
    }

    pub fn attach(&self, on_change: ProbeCallback) {
        *self
            .on_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(on_change);
    }

    pub fn detach(&self) {
        *self
            .on_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_attached(&self) -> bool {
        self.on_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Record a sample and notify if it changed the observation.
    pub fn publish(&self, sample: Result<Reading, ProbeError>) -> bool {
        self.publish_with(|| sample)
    }

    /// Like [`publish`](Self::publish), but computes the sample while the
    /// callback slot is held, so a handler's own state update and the
    /// notification are not split by a concurrent `detach`.
    pub fn publish_with<F>(&self, sample: F) -> bool
    where
        F: FnOnce() -> Result<Reading, ProbeError>,
    {
        let on_change = self
            .on_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let changed = self.cell.record(sample());
        if changed {
            if let Some(callback) = on_change.as_ref() {
                callback();
            }
        }
        changed
    }
}
