//! Probe capability interface for call-state inference.
//!
//! A probe wraps one platform signal (audio mode, foreground app, native call
//! observer, audio route) and exposes its latest best-effort reading as an
//! [`Observation`]. Every probe keeps its own cached observation:
//!
//! - push-driven probes refresh the cache from their notification handler
//! - poll-driven probes refresh it from a [`PollingSampler`] thread they own
//!
//! Either way the engine reads [`Probe::current_observation`] without
//! blocking, and is nudged through the [`ProbeCallback`] whenever a cached
//! observation changes.

mod cell;
mod error;
mod manual;
mod observation;
mod push;
mod sampler;

pub use cell::ObservationCell;
pub use error::ProbeError;
pub use manual::{ManualProbe, NullProbe};
pub use observation::{Activity, CallTypeHint, Observation, Reading};
pub use push::PushCell;
pub use sampler::{PollingSampler, DEFAULT_SAMPLE_INTERVAL};

use std::sync::Arc;

/// Callback invoked by a probe when its cached observation changes.
pub type ProbeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Shared probe handle.
pub type ProbeRef = Arc<dyn Probe>;

pub fn new_callback<F>(f: F) -> ProbeCallback
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A source of best-effort call-activity observations.
///
/// Implementations must uphold:
/// - `current_observation` returns the cached value and never waits on the OS
/// - `stop` is idempotent, and no `on_change` call starts after it returns
/// - failing to initialize is not an error: the probe reports
///   [`Observation::unknown`] until stopped
pub trait Probe: Send + Sync {
    /// Stable identifier, also used as the observation `source_id`.
    fn id(&self) -> &str;

    /// Acquire the underlying signal and begin updating the cache.
    fn start(&self, on_change: ProbeCallback);

    /// Release the underlying signal.
    fn stop(&self);

    /// Latest cached observation.
    fn current_observation(&self) -> Observation;
}

/// How a probe takes part in reduction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProbeRegistration {
    pub id: String,
    /// Higher wins when active probes disagree on the call type.
    pub priority: i32,
}

impl ProbeRegistration {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            priority,
        }
    }
}
