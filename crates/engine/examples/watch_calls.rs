//! Example: Run the engine against a scripted device and print changes.
//!
//! Run with: cargo run -p callwatch-engine --example watch_calls

use callwatch_detect::{
    priorities, AudioMode, AudioModeProbe, AudioModeReader, CallEvent, CallObserverProbe,
    CallObserverSource, EventHandler, ForegroundAppProbe, ForegroundAppReader, ProbeError,
    Subscription,
};
use callwatch_engine::{new_subscriber, CallStateEngine, EngineConfig};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fake device following a fixed timeline:
///
/// - 0-2s: idle
/// - 2-5s: video meeting app in the foreground, audio in communication mode
/// - 5-6s: idle
/// - 6-9s: cellular call reported by the call observer
/// - 9s+: idle
struct ScriptedDevice {
    started: Instant,
    handler: Mutex<Option<EventHandler<CallEvent>>>,
}

impl ScriptedDevice {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn fire(&self, event: CallEvent) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

impl AudioModeReader for ScriptedDevice {
    fn audio_mode(&self) -> Result<AudioMode, ProbeError> {
        let secs = self.elapsed().as_secs_f32();
        Ok(match secs {
            s if (2.0..5.0).contains(&s) => AudioMode::InCommunication,
            s if (6.0..9.0).contains(&s) => AudioMode::InCall,
            _ => AudioMode::Normal,
        })
    }
}

impl ForegroundAppReader for ScriptedDevice {
    fn foreground_app(&self) -> Result<Option<String>, ProbeError> {
        let secs = self.elapsed().as_secs_f32();
        if (2.0..5.0).contains(&secs) {
            Ok(Some("us.zoom.videomeetings".to_string()))
        } else {
            Ok(Some("com.android.launcher".to_string()))
        }
    }
}

impl CallObserverSource for ScriptedDevice {
    fn subscribe(&self, handler: EventHandler<CallEvent>) -> Result<Subscription, ProbeError> {
        *self
            .handler
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(handler);
        Ok(Subscription::empty())
    }
}

fn main() {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter("callwatch_engine=debug,callwatch_detect=debug")
        .init();

    println!("=== Call State Example ===");
    println!("Replaying a scripted device for 10 seconds...\n");

    let device = Arc::new(ScriptedDevice {
        started: Instant::now(),
        handler: Mutex::new(None),
    });
    let sample_every = Duration::from_millis(250);

    let engine = CallStateEngine::builder()
        .config(EngineConfig::default().with_tick_interval(Duration::from_millis(500)))
        .probe(
            CallObserverProbe::new(device.clone()),
            priorities::CALL_OBSERVER,
        )
        .probe(
            ForegroundAppProbe::new(device.clone()).interval(sample_every),
            priorities::FOREGROUND_APP,
        )
        .probe(
            AudioModeProbe::new(device.clone()).interval(sample_every),
            priorities::AUDIO_MODE,
        )
        .build();
    let engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to build engine: {e}");
            return;
        }
    };

    let started = device.started;
    engine.set_subscriber(new_subscriber(move |state| {
        println!(
            "[{:>5.2}s] Call: {:6} | Type: {}",
            started.elapsed().as_secs_f32(),
            if state.is_active() { "yes" } else { "no" },
            state.call_type()
        );
    }));
    engine.initialize();

    std::thread::sleep(Duration::from_secs(6));
    device.fire(CallEvent::connected("cell-1"));
    std::thread::sleep(Duration::from_secs(3));
    device.fire(CallEvent::ended("cell-1"));
    std::thread::sleep(Duration::from_secs(1));

    engine.dispose();
    println!("\nDone.");
}
