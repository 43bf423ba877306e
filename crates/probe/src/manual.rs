//! Probes that need no platform signal.

use crate::error::ProbeError;
use crate::observation::{Observation, Reading};
use crate::push::PushCell;
use crate::{Probe, ProbeCallback};

/// Push-driven probe whose readings are supplied by the host.
///
/// Useful for signals that arrive through another channel (a host-side call
/// SDK, a VoIP stack) and for simulations. Readings set while stopped are
/// cached but do not notify anyone.
pub struct ManualProbe {
    push: PushCell,
}

impl ManualProbe {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            push: PushCell::new(id),
        }
    }

    pub fn set(&self, reading: Reading) {
        self.push.publish(Ok(reading));
    }

    pub fn fail(&self, error: ProbeError) {
        self.push.publish(Err(error));
    }
}

impl Probe for ManualProbe {
    fn id(&self) -> &str {
        self.push.source_id()
    }

    fn start(&self, on_change: ProbeCallback) {
        self.push.attach(on_change);
    }

    fn stop(&self) {
        self.push.detach();
    }

    fn current_observation(&self) -> Observation {
        self.push.observation()
    }
}

/// Probe for a signal the platform does not offer. Always `Unknown`.
pub struct NullProbe {
    id: String,
}

impl NullProbe {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Probe for NullProbe {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&self, _on_change: ProbeCallback) {}

    fn stop(&self) {}

    fn current_observation(&self) -> Observation {
        Observation::unknown(self.id.clone())
    }
}
