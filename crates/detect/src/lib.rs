//! Platform call signals wrapped as callwatch probes.
//!
//! Each probe talks to the OS through a small reader or source trait that
//! the host implements against its platform API:
//!
//! | probe                | collaborator             | style |
//! |----------------------|--------------------------|-------|
//! | [`CallObserverProbe`]| [`CallObserverSource`]   | push  |
//! | [`ForegroundAppProbe`]| [`ForegroundAppReader`] | poll  |
//! | [`AudioModeProbe`]   | [`AudioModeReader`]      | poll  |
//! | [`AudioRouteProbe`]  | [`AudioSessionSource`]   | push  |
//!
//! Permission checks and API-availability branching live in those
//! implementations; they report [`ProbeError::Unavailable`] when a signal
//! cannot be read at all.

mod apps;
mod audio_mode;
mod audio_route;
mod call_observer;
mod foreground;
mod subscription;

pub use apps::{filter_video_calling_apps, is_video_calling_app, VIDEO_CALLING_APPS};
pub use audio_mode::{reading_for_mode, AudioMode, AudioModePolicy, AudioModeProbe, AudioModeReader};
pub use audio_route::{AudioRoute, AudioRouteProbe, AudioSessionEvent, AudioSessionSource};
pub use call_observer::{CallEvent, CallObserverProbe, CallObserverSource};
pub use foreground::{FallbackAppReader, ForegroundAppProbe, ForegroundAppReader};
pub use subscription::{new_handler, EventHandler, Subscription};

pub use callwatch_probe::ProbeError;

/// Default probe ids.
pub mod probe_ids {
    pub const CALL_OBSERVER: &str = "call_observer";
    pub const FOREGROUND_APP: &str = "foreground_app";
    pub const AUDIO_MODE: &str = "audio_mode";
    pub const AUDIO_ROUTE: &str = "audio_route";
}

/// Default priorities. A native call observer outranks every heuristic for
/// phone calls; a video-calling app in the foreground outranks the audio
/// mode guess for video calls.
pub mod priorities {
    pub const CALL_OBSERVER: i32 = 100;
    pub const FOREGROUND_APP: i32 = 80;
    pub const AUDIO_MODE: i32 = 50;
    pub const AUDIO_ROUTE: i32 = 20;
}
