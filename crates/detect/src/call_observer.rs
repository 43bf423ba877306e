//! Native call-observer probe (push-driven).
//!
//! Wraps a CallKit-style observer: the OS reports every call change, and the
//! probe is active while any observed call has not ended.

use crate::subscription::{EventHandler, Subscription};
use callwatch_probe::{CallTypeHint, Observation, Probe, ProbeCallback, ProbeError, PushCell, Reading};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// One call-changed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    pub call_id: String,
    pub is_outgoing: bool,
    pub has_connected: bool,
    pub has_ended: bool,
}

impl CallEvent {
    pub fn ringing(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            is_outgoing: false,
            has_connected: false,
            has_ended: false,
        }
    }

    pub fn connected(call_id: impl Into<String>) -> Self {
        Self {
            has_connected: true,
            ..Self::ringing(call_id)
        }
    }

    pub fn ended(call_id: impl Into<String>) -> Self {
        Self {
            has_ended: true,
            ..Self::ringing(call_id)
        }
    }
}

/// Platform call observer.
pub trait CallObserverSource: Send + Sync {
    /// Register `handler` for call changes. Dropping the returned guard
    /// unregisters it.
    fn subscribe(&self, handler: EventHandler<CallEvent>) -> Result<Subscription, ProbeError>;

    /// Calls already in progress when the probe starts.
    fn current_calls(&self) -> Result<Vec<CallEvent>, ProbeError> {
        Ok(Vec::new())
    }
}

struct ObserverState {
    push: PushCell,
    calls: Mutex<HashSet<String>>,
}

impl ObserverState {
    fn handle(&self, event: CallEvent) {
        self.push.publish_with(|| {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            if event.has_ended {
                calls.remove(&event.call_id);
            } else {
                calls.insert(event.call_id.clone());
            }
            tracing::debug!(
                call_id = %event.call_id,
                outgoing = event.is_outgoing,
                connected = event.has_connected,
                ended = event.has_ended,
                ongoing = calls.len(),
                "call_changed"
            );
            Ok(reading_for_calls(&calls))
        });
    }
}

fn reading_for_calls(calls: &HashSet<String>) -> Reading {
    if calls.is_empty() {
        Reading::INACTIVE
    } else {
        // The observer cannot tell video from voice.
        Reading::active(CallTypeHint::Voice)
    }
}

pub struct CallObserverProbe {
    source: Arc<dyn CallObserverSource>,
    state: Arc<ObserverState>,
    subscription: Mutex<Option<Subscription>>,
}

impl CallObserverProbe {
    pub fn new(source: Arc<dyn CallObserverSource>) -> Self {
        Self::with_id(crate::probe_ids::CALL_OBSERVER, source)
    }

    pub fn with_id(id: impl Into<String>, source: Arc<dyn CallObserverSource>) -> Self {
        Self {
            source,
            state: Arc::new(ObserverState {
                push: PushCell::new(id),
                calls: Mutex::new(HashSet::new()),
            }),
            subscription: Mutex::new(None),
        }
    }
}

impl Probe for CallObserverProbe {
    fn id(&self) -> &str {
        self.state.push.source_id()
    }

    fn start(&self, on_change: ProbeCallback) {
        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if subscription.is_some() {
            return;
        }

        self.state.push.cell().reset();
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.state.push.attach(on_change);

        let state = Arc::clone(&self.state);
        let handler: EventHandler<CallEvent> = Arc::new(move |event| state.handle(event));

        match self.source.subscribe(handler) {
            Ok(guard) => {
                *subscription = Some(guard);
                tracing::debug!(probe = %self.id(), "call_observer_subscribed");
            }
            Err(e) => {
                self.state.push.publish(Err(e));
                return;
            }
        }

        match self.source.current_calls() {
            Ok(calls) => {
                for call in calls {
                    self.state.handle(call);
                }
                // Publish the baseline even when nothing is ongoing.
                let calls = self
                    .state
                    .calls
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                self.state.push.publish(Ok(reading_for_calls(&calls)));
            }
            Err(e) => {
                self.state.push.publish(Err(e));
            }
        }
    }

    fn stop(&self) {
        self.state.push.detach();
        let guard = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(guard) = guard {
            guard.release();
            tracing::debug!(probe = %self.id(), "call_observer_released");
        }
    }

    fn current_observation(&self) -> Observation {
        self.state.push.observation()
    }
}
