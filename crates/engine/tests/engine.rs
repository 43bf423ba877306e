//! Integration tests for the call-state engine.
//!
//! Push-driven probes plus an hour-long tick keep most tests deterministic:
//! every state change is delivered synchronously from `ManualProbe::set`.

use callwatch_detect::{
    AudioMode, AudioModeProbe, AudioModeReader, CallEvent, CallObserverProbe, CallObserverSource,
    EventHandler, ProbeError, Subscription,
};
use callwatch_engine::{
    new_subscriber, CallState, CallStateEngine, CallType, EngineConfig, Observation, Probe,
    ProbeCallback,
};
use callwatch_probe::{CallTypeHint, ManualProbe, NullProbe, Reading};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn quiet_config() -> EngineConfig {
    EngineConfig::default().with_tick_interval(Duration::from_secs(3600))
}

#[derive(Clone, Default)]
struct Recorder {
    states: Arc<Mutex<Vec<CallState>>>,
}

impl Recorder {
    fn attach(&self, engine: &CallStateEngine) {
        let states = Arc::clone(&self.states);
        engine.set_subscriber(new_subscriber(move |state| {
            states.lock().unwrap().push(state);
        }));
    }

    fn states(&self) -> Vec<CallState> {
        self.states.lock().unwrap().clone()
    }

    fn call_types(&self) -> Vec<CallType> {
        self.states().iter().map(|s| s.call_type()).collect()
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Push probe that counts lifecycle calls.
struct CountingProbe {
    inner: ManualProbe,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl CountingProbe {
    fn new(id: &str) -> Self {
        Self {
            inner: ManualProbe::new(id),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }
}

impl Probe for CountingProbe {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn start(&self, on_change: ProbeCallback) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.inner.start(on_change);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.stop();
    }

    fn current_observation(&self) -> Observation {
        self.inner.current_observation()
    }
}

// =============================================================================
// Reduction through the engine
// =============================================================================

mod reduction {
    use super::*;

    #[test]
    fn test_higher_priority_probe_decides_call_type() {
        let a = Arc::new(ManualProbe::new("a"));
        let b = Arc::new(ManualProbe::new("b"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(a.clone(), 10)
            .probe_ref(b.clone(), 5)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        b.set(Reading::active(CallTypeHint::Voice));
        a.set(Reading::active(CallTypeHint::Video));

        assert_eq!(engine.current_state(), CallState::new(CallType::VideoCall));
        assert_eq!(
            recorder.call_types(),
            vec![CallType::PhoneCall, CallType::VideoCall]
        );
        engine.dispose();
    }

    #[test]
    fn test_unknown_hints_default_to_phone_call() {
        let a = Arc::new(ManualProbe::new("a"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(a.clone(), 1)
            .probe(NullProbe::new("b"), 2)
            .build()
            .unwrap();
        engine.initialize();

        a.set(Reading::active(CallTypeHint::Unknown));

        assert_eq!(engine.current_state(), CallState::new(CallType::PhoneCall));
        engine.dispose();
    }

    #[test]
    fn test_equal_priority_resolves_the_same_way_every_run() {
        for _ in 0..10 {
            let voice = Arc::new(ManualProbe::new("route"));
            let video = Arc::new(ManualProbe::new("foreground"));
            let engine = CallStateEngine::builder()
                .config(quiet_config())
                .probe_ref(voice.clone(), 50)
                .probe_ref(video.clone(), 50)
                .build()
                .unwrap();
            engine.initialize();

            voice.set(Reading::active(CallTypeHint::Voice));
            video.set(Reading::active(CallTypeHint::Video));

            // "foreground" sorts before "route".
            assert_eq!(engine.current_state().call_type(), CallType::VideoCall);
            engine.dispose();
        }
    }

    #[test]
    fn test_all_unknown_probes_stay_idle() {
        let engine = CallStateEngine::builder()
            .config(EngineConfig::default().with_tick_interval(Duration::from_millis(10)))
            .probe(NullProbe::new("call_observer"), 100)
            .probe(NullProbe::new("audio_mode"), 50)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        std::thread::sleep(Duration::from_millis(80));
        engine.dispose();

        assert!(recorder.states().is_empty());
        assert_eq!(engine.current_state(), CallState::IDLE);
    }
}

// =============================================================================
// Change detection
// =============================================================================

mod emission {
    use super::*;

    #[test]
    fn test_one_emission_per_transition() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        for reading in [
            Reading::INACTIVE,
            Reading::INACTIVE,
            Reading::active(CallTypeHint::Voice),
            Reading::active(CallTypeHint::Voice),
            Reading::INACTIVE,
        ] {
            probe.set(reading);
            engine.refresh();
        }

        assert_eq!(
            recorder.call_types(),
            vec![CallType::PhoneCall, CallType::None]
        );
        engine.dispose();
    }

    #[test]
    fn test_no_state_pushed_before_first_change() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);

        engine.initialize();
        engine.refresh();

        assert!(recorder.states().is_empty());
        engine.dispose();
    }

    #[test]
    fn test_concurrent_pushes_never_repeat_a_state() {
        let probes: Vec<Arc<ManualProbe>> = (0..4)
            .map(|i| Arc::new(ManualProbe::new(format!("probe_{i}"))))
            .collect();
        let mut builder = CallStateEngine::builder().config(
            EngineConfig::default().with_tick_interval(Duration::from_millis(1)),
        );
        for (i, probe) in probes.iter().enumerate() {
            builder = builder.probe_ref(probe.clone(), i as i32);
        }
        let engine = builder.build().unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        let handles: Vec<_> = probes
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, probe)| {
                std::thread::spawn(move || {
                    for n in 0..200 {
                        let reading = match (n + i) % 3 {
                            0 => Reading::active(CallTypeHint::Voice),
                            1 => Reading::active(CallTypeHint::Video),
                            _ => Reading::INACTIVE,
                        };
                        probe.set(reading);
                    }
                    probe.set(Reading::INACTIVE);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        engine.refresh();
        engine.dispose();

        let states = recorder.states();
        for pair in states.windows(2) {
            assert_ne!(pair[0], pair[1], "consecutive duplicate emission");
        }
        assert_ne!(states.first(), Some(&CallState::IDLE));
        assert_eq!(states.last(), Some(&CallState::IDLE));
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn test_initialize_twice_is_same_as_once() {
        let probe = Arc::new(CountingProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);

        engine.initialize();
        engine.initialize();
        probe.inner.set(Reading::active(CallTypeHint::Voice));
        engine.refresh();

        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.call_types(), vec![CallType::PhoneCall]);

        engine.dispose();
        assert_eq!(probe.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispose_while_stopped_is_noop() {
        let probe = Arc::new(CountingProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();

        engine.dispose();
        engine.initialize();
        engine.dispose();
        engine.dispose();

        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
        assert_eq!(probe.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_emission_after_dispose() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(EngineConfig::default().with_tick_interval(Duration::from_millis(5)))
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();
        engine.dispose();

        probe.set(Reading::active(CallTypeHint::Video));
        engine.refresh();
        std::thread::sleep(Duration::from_millis(40));

        assert!(recorder.states().is_empty());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_dispose_clears_subscriber() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);

        engine.initialize();
        engine.dispose();
        engine.initialize();
        probe.set(Reading::active(CallTypeHint::Voice));

        // State is still tracked, but nobody is listening.
        assert_eq!(engine.current_state(), CallState::new(CallType::PhoneCall));
        assert!(recorder.states().is_empty());
        engine.dispose();
    }

    #[test]
    fn test_reinitialize_starts_from_idle() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();

        engine.initialize();
        probe.set(Reading::active(CallTypeHint::Voice));
        assert!(engine.current_state().is_active());
        engine.dispose();

        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();
        engine.refresh();

        // The call is still going: the new subscriber hears about it.
        assert_eq!(recorder.call_types(), vec![CallType::PhoneCall]);
        engine.dispose();
    }

    #[test]
    fn test_dispose_while_pushes_are_in_flight() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe_ref(probe.clone(), 1)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        let stop = Arc::new(AtomicBool::new(false));
        let pusher = {
            let probe = Arc::clone(&probe);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut n = 0u32;
                while !stop.load(Ordering::SeqCst) {
                    let reading = if n % 2 == 0 {
                        Reading::active(CallTypeHint::Voice)
                    } else {
                        Reading::INACTIVE
                    };
                    probe.set(reading);
                    n += 1;
                }
            })
        };

        assert!(wait_until(Duration::from_secs(2), || recorder.states().len() >= 4));
        engine.dispose();
        let delivered = recorder.states().len();

        std::thread::sleep(Duration::from_millis(30));
        stop.store(true, Ordering::SeqCst);
        pusher.join().unwrap();

        assert_eq!(recorder.states().len(), delivered);
    }

    #[test]
    fn test_dispose_from_another_thread() {
        let probe = Arc::new(ManualProbe::new("voip"));
        let engine = Arc::new(
            CallStateEngine::builder()
                .config(EngineConfig::default().with_tick_interval(Duration::from_millis(5)))
                .probe_ref(probe.clone(), 1)
                .build()
                .unwrap(),
        );
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        let remote = Arc::clone(&engine);
        std::thread::spawn(move || remote.dispose()).join().unwrap();

        probe.set(Reading::active(CallTypeHint::Voice));
        assert!(!engine.is_running());
        assert!(recorder.states().is_empty());
    }
}

// =============================================================================
// Poll-driven probes
// =============================================================================

mod polling {
    use super::*;

    struct SwitchableMode(Mutex<Result<AudioMode, ProbeError>>);

    impl AudioModeReader for SwitchableMode {
        fn audio_mode(&self) -> Result<AudioMode, ProbeError> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_tick_picks_up_sampled_audio_mode() {
        let reader = Arc::new(SwitchableMode(Mutex::new(Ok(AudioMode::Normal))));
        let probe = AudioModeProbe::new(reader.clone()).interval(Duration::from_millis(5));
        let config = EngineConfig {
            reduce_on_push: false,
            ..EngineConfig::default().with_tick_interval(Duration::from_millis(10))
        };
        let engine = CallStateEngine::builder()
            .config(config)
            .probe(probe, 50)
            .build()
            .unwrap();
        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();

        *reader.0.lock().unwrap() = Ok(AudioMode::InCommunication);
        assert!(wait_until(Duration::from_secs(2), || {
            engine.current_state() == CallState::new(CallType::VideoCall)
        }));

        *reader.0.lock().unwrap() = Ok(AudioMode::Normal);
        assert!(wait_until(Duration::from_secs(2), || {
            engine.current_state() == CallState::IDLE
        }));
        engine.dispose();

        assert_eq!(
            recorder.call_types(),
            vec![CallType::VideoCall, CallType::None]
        );
    }

    /// Call observer whose calls are fired by hand.
    #[derive(Default)]
    struct HandFiredCalls {
        handler: Mutex<Option<EventHandler<CallEvent>>>,
    }

    impl HandFiredCalls {
        fn fire(&self, event: CallEvent) {
            let handler = self.handler.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(event);
            }
        }
    }

    /// Local handle so the foreign trait can be implemented (orphan rule).
    struct HandFiredHandle(Arc<HandFiredCalls>);

    impl CallObserverSource for HandFiredHandle {
        fn subscribe(&self, handler: EventHandler<CallEvent>) -> Result<Subscription, ProbeError> {
            *self.0.handler.lock().unwrap() = Some(handler);
            let calls = Arc::clone(&self.0);
            Ok(Subscription::new(move || {
                *calls.handler.lock().unwrap() = None;
            }))
        }
    }

    #[test]
    fn test_restart_does_not_replay_previous_session() {
        let calls = Arc::new(HandFiredCalls::default());
        let mode = Arc::new(SwitchableMode(Mutex::new(Ok(AudioMode::InCall))));
        let engine = CallStateEngine::builder()
            .config(EngineConfig::default().with_tick_interval(Duration::from_millis(10)))
            .probe(CallObserverProbe::new(Arc::new(HandFiredHandle(Arc::clone(&calls)))), 100)
            .probe(
                AudioModeProbe::new(mode.clone()).interval(Duration::from_millis(5)),
                50,
            )
            .build()
            .unwrap();

        engine.initialize();
        assert!(wait_until(Duration::from_secs(2), || {
            engine.current_state() == CallState::new(CallType::PhoneCall)
        }));
        engine.dispose();

        // The call ends while nobody is watching.
        *mode.0.lock().unwrap() = Ok(AudioMode::Normal);

        let recorder = Recorder::default();
        recorder.attach(&engine);
        engine.initialize();
        std::thread::sleep(Duration::from_millis(80));

        assert!(recorder.states().is_empty(), "got {:?}", recorder.states());
        assert_eq!(engine.current_state(), CallState::IDLE);

        // The restarted probes still report fresh activity.
        calls.fire(CallEvent::connected("cell-1"));
        assert_eq!(recorder.call_types(), vec![CallType::PhoneCall]);
        engine.dispose();
    }

    #[test]
    fn test_unavailable_probe_does_not_stop_the_engine() {
        let denied = Arc::new(SwitchableMode(Mutex::new(Err(ProbeError::unavailable(
            "audio service missing",
        )))));
        let voip = Arc::new(ManualProbe::new("voip"));
        let engine = CallStateEngine::builder()
            .config(quiet_config())
            .probe(
                AudioModeProbe::new(denied).interval(Duration::from_millis(5)),
                50,
            )
            .probe_ref(voip.clone(), 10)
            .build()
            .unwrap();
        engine.initialize();

        voip.set(Reading::active(CallTypeHint::Video));

        assert_eq!(engine.current_state(), CallState::new(CallType::VideoCall));
        let audio_mode = engine
            .observations()
            .into_iter()
            .find(|o| o.source_id == "audio_mode")
            .unwrap();
        assert!(!audio_mode.is_active());
        engine.dispose();
    }
}
