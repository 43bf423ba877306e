//! Call-state engine - owns the probes, runs reduction passes and delivers
//! de-duplicated states to the subscriber.

use crate::change::should_emit;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::reducer::Reducer;
use crate::state::CallState;
use callwatch_probe::{Observation, Probe, ProbeCallback, ProbeRef, ProbeRegistration};
use crossbeam_channel::{bounded, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle;

/// Subscriber for call-state changes.
pub type CallStateCallback = Arc<dyn Fn(CallState) + Send + Sync + 'static>;

pub fn new_subscriber<F>(f: F) -> CallStateCallback
where
    F: Fn(CallState) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What caused a reduction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tick,
    Push,
    Refresh,
}

struct RegisteredProbe {
    registration: ProbeRegistration,
    probe: ProbeRef,
}

/// Everything a reduction pass reads or writes. Guarded by one mutex so tick
/// passes and probe push passes are serialized.
struct PassState {
    observations: HashMap<String, Observation>,
    last: CallState,
    subscriber: Option<CallStateCallback>,
}

struct Shared {
    probes: Vec<RegisteredProbe>,
    reducer: Reducer,
    running: AtomicBool,
    pass: Mutex<PassState>,
}

impl Shared {
    fn lock_pass(&self) -> MutexGuard<'_, PassState> {
        self.pass.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gather, reduce, change-detect and deliver.
    ///
    /// Delivery happens under the pass lock: the stored state is updated
    /// before the subscriber sees it, and `dispose` cannot return while a
    /// delivery is in flight.
    fn evaluate(&self, trigger: Trigger) {
        let mut pass = self.lock_pass();
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        for entry in &self.probes {
            let observation = entry.probe.current_observation();
            pass.observations
                .insert(entry.registration.id.clone(), observation);
        }

        let next = self.reducer.reduce(&pass.observations);
        tracing::trace!(?trigger, state = %next, "reduction_pass");

        if !should_emit(&pass.last, &next) {
            return;
        }

        tracing::info!(
            ?trigger,
            active = next.is_active(),
            call_type = %next.call_type(),
            previous = %pass.last,
            "call_state_changed"
        );
        pass.last = next;

        if let Some(subscriber) = pass.subscriber.as_ref() {
            subscriber(next);
        }
    }
}

struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Builder for [`CallStateEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    probes: Vec<RegisteredProbe>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a probe. Its `id()` becomes the registration id.
    pub fn probe<P>(self, probe: P, priority: i32) -> Self
    where
        P: Probe + 'static,
    {
        self.probe_ref(Arc::new(probe), priority)
    }

    pub fn probe_ref(mut self, probe: ProbeRef, priority: i32) -> Self {
        let registration = ProbeRegistration::new(probe.id(), priority);
        self.probes.push(RegisteredProbe {
            registration,
            probe,
        });
        self
    }

    pub fn build(self) -> Result<CallStateEngine> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        let mut reducer = Reducer::new(self.config.policy);
        for entry in &self.probes {
            if !seen.insert(entry.registration.id.clone()) {
                return Err(EngineError::DuplicateProbe(entry.registration.id.clone()));
            }
            reducer.register(&entry.registration);
        }

        Ok(CallStateEngine {
            shared: Arc::new(Shared {
                probes: self.probes,
                reducer,
                running: AtomicBool::new(false),
                pass: Mutex::new(PassState {
                    observations: HashMap::new(),
                    last: CallState::IDLE,
                    subscriber: None,
                }),
            }),
            config: self.config,
            ticker: Mutex::new(None),
        })
    }
}

/// Orchestrates probes and emits a de-duplicated call-state stream.
///
/// ```text
/// Stopped --initialize()--> Running --dispose()--> Stopped
/// ```
///
/// All methods take `&self`; share the engine behind an `Arc` to drive it
/// from several threads. The subscriber must not call back into the engine
/// synchronously.
pub struct CallStateEngine {
    config: EngineConfig,
    shared: Arc<Shared>,
    ticker: Mutex<Option<Ticker>>,
}

impl CallStateEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Start all probes and the periodic reduction. No-op while running.
    pub fn initialize(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            tracing::debug!("call state engine already running");
            return;
        }

        {
            let mut pass = self.shared.lock_pass();
            pass.observations.clear();
            pass.last = CallState::IDLE;
        }

        // Pushes raised while probes start are dropped: caches of probes not
        // yet started may still hold the previous session's readings.
        for entry in &self.shared.probes {
            entry.probe.start(self.push_callback());
            tracing::info!(
                probe = %entry.registration.id,
                priority = entry.registration.priority,
                "probe_started"
            );
        }

        self.shared.running.store(true, Ordering::SeqCst);
        self.shared.evaluate(Trigger::Tick);

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let interval = self.config.tick_interval();

        let handle = std::thread::spawn(move || {
            tracing::info!("call state engine started with interval {:?}", interval);

            let ticks = crossbeam_channel::tick(interval);
            loop {
                crossbeam_channel::select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticks) -> _ => shared.evaluate(Trigger::Tick),
                }
            }

            tracing::info!("call state engine stopped");
        });

        *ticker = Some(Ticker { stop_tx, handle });
    }

    /// Stop all probes and the periodic reduction, and drop the subscriber.
    /// No-op while stopped.
    ///
    /// Once this returns no further state is delivered.
    pub fn dispose(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(running) = ticker.take() else {
            return;
        };

        {
            let mut pass = self.shared.lock_pass();
            self.shared.running.store(false, Ordering::SeqCst);
            pass.subscriber = None;
        }

        for entry in &self.shared.probes {
            entry.probe.stop();
            tracing::debug!(probe = %entry.registration.id, "probe_stopped");
        }

        let _ = running.stop_tx.try_send(());
        if running.handle.thread().id() != std::thread::current().id() {
            let _ = running.handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Install the subscriber. Replaces any previous one.
    pub fn set_subscriber(&self, subscriber: CallStateCallback) {
        self.shared.lock_pass().subscriber = Some(subscriber);
    }

    pub fn clear_subscriber(&self) {
        self.shared.lock_pass().subscriber = None;
    }

    /// Run a reduction pass now instead of waiting for the next tick.
    pub fn refresh(&self) {
        self.shared.evaluate(Trigger::Refresh);
    }

    /// Last emitted state (idle before the first change).
    pub fn current_state(&self) -> CallState {
        self.shared.lock_pass().last
    }

    /// Observations used by the most recent reduction pass.
    pub fn observations(&self) -> Vec<Observation> {
        let mut observations: Vec<_> = self
            .shared
            .lock_pass()
            .observations
            .values()
            .cloned()
            .collect();
        observations.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        observations
    }

    pub fn registrations(&self) -> Vec<ProbeRegistration> {
        self.shared
            .probes
            .iter()
            .map(|entry| entry.registration.clone())
            .collect()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn push_callback(&self) -> ProbeCallback {
        if !self.config.reduce_on_push {
            return Arc::new(|| {});
        }

        // Weak: the probes live inside `Shared` and hold this callback.
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.evaluate(Trigger::Push);
            }
        })
    }
}

impl Drop for CallStateEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
