//! Audio-session probe (push-driven).
//!
//! An audio-session interruption usually means another app (most often the
//! phone) took over audio. While interrupted, routing to the earpiece hints
//! at a voice call.

use crate::subscription::{EventHandler, Subscription};
use callwatch_probe::{CallTypeHint, Observation, Probe, ProbeCallback, ProbeError, PushCell, Reading};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioRoute {
    BuiltInReceiver,
    BuiltInSpeaker,
    WiredHeadset,
    Bluetooth,
    CarAudio,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioSessionEvent {
    InterruptionBegan,
    InterruptionEnded,
    RouteChanged { route: AudioRoute },
}

/// Platform audio-session notification source.
pub trait AudioSessionSource: Send + Sync {
    fn subscribe(
        &self,
        handler: EventHandler<AudioSessionEvent>,
    ) -> Result<Subscription, ProbeError>;

    fn current_route(&self) -> Result<AudioRoute, ProbeError>;
}

#[derive(Debug, Clone, Copy, Default)]
struct SessionState {
    interrupted: bool,
    route: AudioRoute,
}

impl SessionState {
    fn apply(&mut self, event: AudioSessionEvent) {
        match event {
            AudioSessionEvent::InterruptionBegan => self.interrupted = true,
            AudioSessionEvent::InterruptionEnded => self.interrupted = false,
            AudioSessionEvent::RouteChanged { route } => self.route = route,
        }
    }

    fn reading(&self) -> Reading {
        if !self.interrupted {
            return Reading::INACTIVE;
        }
        match self.route {
            AudioRoute::BuiltInReceiver => Reading::active(CallTypeHint::Voice),
            _ => Reading::active(CallTypeHint::Unknown),
        }
    }
}

struct RouteProbeState {
    push: PushCell,
    session: Mutex<SessionState>,
}

impl RouteProbeState {
    fn handle(&self, event: AudioSessionEvent) {
        self.push.publish_with(|| {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            session.apply(event);
            tracing::debug!(?event, interrupted = session.interrupted, "audio_session_event");
            Ok(session.reading())
        });
    }
}

pub struct AudioRouteProbe {
    source: Arc<dyn AudioSessionSource>,
    state: Arc<RouteProbeState>,
    subscription: Mutex<Option<Subscription>>,
}

impl AudioRouteProbe {
    pub fn new(source: Arc<dyn AudioSessionSource>) -> Self {
        Self::with_id(crate::probe_ids::AUDIO_ROUTE, source)
    }

    pub fn with_id(id: impl Into<String>, source: Arc<dyn AudioSessionSource>) -> Self {
        Self {
            source,
            state: Arc::new(RouteProbeState {
                push: PushCell::new(id),
                session: Mutex::new(SessionState::default()),
            }),
            subscription: Mutex::new(None),
        }
    }
}

impl Probe for AudioRouteProbe {
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
        *self
            .state
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = SessionState::default();
        self.state.push.attach(on_change);

        let state = Arc::clone(&self.state);
        let handler: EventHandler<AudioSessionEvent> = Arc::new(move |event| state.handle(event));

        match self.source.subscribe(handler) {
            Ok(guard) => *subscription = Some(guard),
            Err(e) => {
                self.state.push.publish(Err(e));
                return;
            }
        }

        // A missing route is not fatal: interruptions alone still count.
        match self.source.current_route() {
            Ok(route) => self
                .state
                .handle(AudioSessionEvent::RouteChanged { route }),
            Err(e) => {
                tracing::debug!(probe = %self.id(), error = %e, "current_route_unreadable");
                let session = *self
                    .state
                    .session
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                self.state.push.publish(Ok(session.reading()));
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
        }
    }

    fn current_observation(&self) -> Observation {
        self.state.push.observation()
    }
}
