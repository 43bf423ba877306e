//! Observation model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a probe believes a call is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    #[default]
    Unknown,
    Inactive,
    Active,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        matches!(self, Activity::Active)
    }
}

/// What kind of call a probe believes is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CallTypeHint {
    #[default]
    Unknown,
    Voice,
    Video,
}

/// The signal-level content of an observation, without provenance.
///
/// Samplers and notification handlers produce readings; the
/// [`ObservationCell`](crate::ObservationCell) stamps them into observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reading {
    pub activity: Activity,
    pub hint: CallTypeHint,
}

impl Reading {
    pub const UNKNOWN: Reading = Reading {
        activity: Activity::Unknown,
        hint: CallTypeHint::Unknown,
    };

    pub const INACTIVE: Reading = Reading {
        activity: Activity::Inactive,
        hint: CallTypeHint::Unknown,
    };

    pub fn active(hint: CallTypeHint) -> Self {
        Self {
            activity: Activity::Active,
            hint,
        }
    }
}

/// Latest sampled value from one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub source_id: String,
    pub activity: Activity,
    pub call_type_hint: CallTypeHint,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(source_id: impl Into<String>, reading: Reading) -> Self {
        Self {
            source_id: source_id.into(),
            activity: reading.activity,
            call_type_hint: reading.hint,
            observed_at: Utc::now(),
        }
    }

    /// Observation of a probe that knows nothing.
    pub fn unknown(source_id: impl Into<String>) -> Self {
        Self::new(source_id, Reading::UNKNOWN)
    }

    pub fn reading(&self) -> Reading {
        Reading {
            activity: self.activity,
            hint: self.call_type_hint,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activity.is_active()
    }
}
