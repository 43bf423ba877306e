//! Engine configuration.

use crate::error::ConfigError;
use crate::state::CallType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default reduction cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Policy knobs for the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionPolicy {
    /// Call type reported when a call is active but no active probe knows
    /// what kind it is.
    pub default_call_type: CallType,
}

impl Default for ReductionPolicy {
    fn default() -> Self {
        Self {
            default_call_type: CallType::PhoneCall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Milliseconds between periodic reduction passes.
    pub tick_interval_ms: u64,

    /// Run a reduction pass as soon as a probe reports a change, instead of
    /// waiting for the next tick.
    pub reduce_on_push: bool,

    pub policy: ReductionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            reduce_on_push: true,
            policy: ReductionPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.policy.default_call_type == CallType::None {
            return Err(ConfigError::InactiveDefaultCallType);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }
}
