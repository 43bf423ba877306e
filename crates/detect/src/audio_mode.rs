//! Audio-mode probe (poll-driven).

use callwatch_probe::{
    CallTypeHint, Observation, ObservationCell, PollingSampler, Probe, ProbeCallback, ProbeError,
    Reading, DEFAULT_SAMPLE_INTERVAL,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// System audio mode, as reported by the platform audio manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Normal,
    Ringtone,
    InCall,
    /// VoIP / chat-app audio session.
    InCommunication,
    CallScreening,
}

/// Reads the current audio mode. Must return promptly.
pub trait AudioModeReader: Send + Sync {
    fn audio_mode(&self) -> Result<AudioMode, ProbeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioModePolicy {
    /// Hint reported for `InCommunication`. Chat apps use this mode for both
    /// voice and video calls.
    pub in_communication_hint: CallTypeHint,
}

impl Default for AudioModePolicy {
    fn default() -> Self {
        Self {
            in_communication_hint: CallTypeHint::Video,
        }
    }
}

pub fn reading_for_mode(mode: AudioMode, policy: &AudioModePolicy) -> Reading {
    match mode {
        AudioMode::Normal | AudioMode::CallScreening => Reading::INACTIVE,
        AudioMode::InCall | AudioMode::Ringtone => Reading::active(CallTypeHint::Voice),
        AudioMode::InCommunication => Reading::active(policy.in_communication_hint),
    }
}

/// Samples the audio mode on its own thread.
pub struct AudioModeProbe {
    reader: Arc<dyn AudioModeReader>,
    policy: AudioModePolicy,
    interval: Duration,
    cell: Arc<ObservationCell>,
    sampler: PollingSampler,
}

impl AudioModeProbe {
    pub fn new(reader: Arc<dyn AudioModeReader>) -> Self {
        Self::with_id(crate::probe_ids::AUDIO_MODE, reader)
    }

    pub fn with_id(id: impl Into<String>, reader: Arc<dyn AudioModeReader>) -> Self {
        Self {
            reader,
            policy: AudioModePolicy::default(),
            interval: DEFAULT_SAMPLE_INTERVAL,
            cell: Arc::new(ObservationCell::new(id)),
            sampler: PollingSampler::new(),
        }
    }

    pub fn policy(mut self, policy: AudioModePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Probe for AudioModeProbe {
    fn id(&self) -> &str {
        self.cell.source_id()
    }

    fn start(&self, on_change: ProbeCallback) {
        if self.sampler.is_running() {
            return;
        }
        self.cell.reset();

        let reader = Arc::clone(&self.reader);
        let policy = self.policy;
        self.sampler.start(
            Arc::clone(&self.cell),
            self.interval,
            on_change,
            move || {
                reader
                    .audio_mode()
                    .map(|mode| reading_for_mode(mode, &policy))
            },
        );
    }

    fn stop(&self) {
        self.sampler.stop();
    }

    fn current_observation(&self) -> Observation {
        self.cell.get()
    }
}
