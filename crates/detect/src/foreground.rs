//! Foreground-app probe (poll-driven).

use crate::apps::VIDEO_CALLING_APPS;
use callwatch_probe::{
    CallTypeHint, Observation, ObservationCell, PollingSampler, Probe, ProbeCallback, ProbeError,
    Reading, DEFAULT_SAMPLE_INTERVAL,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Reads the package / bundle id of the app in the foreground.
pub trait ForegroundAppReader: Send + Sync {
    fn foreground_app(&self) -> Result<Option<String>, ProbeError>;
}

/// Tries `primary`, then `fallback` when the primary fails or sees nothing.
///
/// Mirrors platforms where the precise API (usage statistics) needs a
/// permission the coarse one (task list) does not.
pub struct FallbackAppReader<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackAppReader<P, F>
where
    P: ForegroundAppReader,
    F: ForegroundAppReader,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> ForegroundAppReader for FallbackAppReader<P, F>
where
    P: ForegroundAppReader,
    F: ForegroundAppReader,
{
    fn foreground_app(&self) -> Result<Option<String>, ProbeError> {
        let primary_error = match self.primary.foreground_app() {
            Ok(Some(app)) => return Ok(Some(app)),
            Ok(None) => None,
            Err(e) => Some(e),
        };

        match (primary_error, self.fallback.foreground_app()) {
            (_, Ok(Some(app))) => Ok(Some(app)),
            (None, _) | (_, Ok(None)) => Ok(None),
            (Some(primary), Err(fallback)) => {
                tracing::debug!(%primary, %fallback, "foreground_app_readers_failed");
                if primary.is_permanent() && fallback.is_permanent() {
                    Err(fallback)
                } else {
                    Err(ProbeError::transient(format!("{primary}; {fallback}")))
                }
            }
        }
    }
}

/// Reports an active video call while a known video-calling app is in the
/// foreground.
pub struct ForegroundAppProbe {
    reader: Arc<dyn ForegroundAppReader>,
    video_apps: Arc<HashSet<String>>,
    interval: Duration,
    cell: Arc<ObservationCell>,
    sampler: PollingSampler,
}

impl ForegroundAppProbe {
    pub fn new(reader: Arc<dyn ForegroundAppReader>) -> Self {
        Self::with_id(crate::probe_ids::FOREGROUND_APP, reader)
    }

    pub fn with_id(id: impl Into<String>, reader: Arc<dyn ForegroundAppReader>) -> Self {
        Self {
            reader,
            video_apps: Arc::new(VIDEO_CALLING_APPS.iter().map(|s| s.to_string()).collect()),
            interval: DEFAULT_SAMPLE_INTERVAL,
            cell: Arc::new(ObservationCell::new(id)),
            sampler: PollingSampler::new(),
        }
    }

    /// Replace the list of apps that count as a video call.
    pub fn video_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.video_apps = Arc::new(apps.into_iter().map(Into::into).collect());
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

fn reading_for_app(app: Option<&str>, video_apps: &HashSet<String>) -> Reading {
    match app {
        Some(app) if video_apps.contains(app) => Reading::active(CallTypeHint::Video),
        _ => Reading::INACTIVE,
    }
}

impl Probe for ForegroundAppProbe {
    fn id(&self) -> &str {
        self.cell.source_id()
    }

    fn start(&self, on_change: ProbeCallback) {
        if self.sampler.is_running() {
            return;
        }
        self.cell.reset();

        let reader = Arc::clone(&self.reader);
        let video_apps = Arc::clone(&self.video_apps);
        self.sampler.start(
            Arc::clone(&self.cell),
            self.interval,
            on_change,
            move || {
                reader
                    .foreground_app()
                    .map(|app| reading_for_app(app.as_deref(), &video_apps))
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
