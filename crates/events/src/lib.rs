//! Host-facing event contracts for callwatch.
//!
//! Defines the payload hosts receive when the call state changes, and
//! bridges the engine's subscriber callback onto an [`EventBus`].

mod bus;

pub use bus::{EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus, TracingEventBus};

use callwatch_engine::{new_subscriber, CallState, CallStateCallback, CallType};
use serde::{Deserialize, Serialize};

/// Event emitted when the inferred call state changes.
///
/// Producers: call-state engine (via [`bus_subscriber`])
/// Consumers: host application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStateChangedEvent {
    pub is_call_active: bool,
    pub call_type: CallType,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl From<CallState> for CallStateChangedEvent {
    fn from(state: CallState) -> Self {
        Self {
            is_call_active: state.is_active(),
            call_type: state.call_type(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl CallStateChangedEvent {
    pub fn state(&self) -> CallState {
        CallState::new(self.call_type)
    }
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Call state changed event.
    pub const CALL_STATE_CHANGED: &str = "call:state_changed";
}

/// Engine subscriber that forwards every change to `bus`.
pub fn bus_subscriber(bus: EventBusRef) -> CallStateCallback {
    new_subscriber(move |state| {
        let event = CallStateChangedEvent::from(state);
        match serde_json::to_value(&event) {
            Ok(payload) => bus.emit(event_names::CALL_STATE_CHANGED, payload),
            Err(e) => tracing::error!("failed to serialize call state event: {:?}", e),
        }
    })
}
