//! Call-state inference for callwatch.
//!
//! Turns best-effort observations from several probes into one
//! de-duplicated stream of `{ isCallActive, callType }` values.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  state.rs    - CallType, CallState                          │
//! │  reducer.rs  - observations -> CallState (pure)             │
//! │  change.rs   - emission gating (pure)                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  engine.rs   - probe lifecycle, tick loop, delivery         │
//! │  config.rs   - cadence and reduction policy                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  callwatch-probe  - Probe trait, cached observations        │
//! │  callwatch-detect - platform signal wrappers                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use callwatch_engine::{new_subscriber, CallStateEngine};
//! use callwatch_probe::ManualProbe;
//!
//! let engine = CallStateEngine::builder()
//!     .probe(ManualProbe::new("voip"), 10)
//!     .build()?;
//!
//! engine.set_subscriber(new_subscriber(|state| println!("{state}")));
//! engine.initialize();
//! ```

mod change;
mod config;
mod engine;
mod error;
mod reducer;
mod state;

pub use change::should_emit;
pub use config::{EngineConfig, ReductionPolicy, DEFAULT_TICK_INTERVAL};
pub use engine::{new_subscriber, CallStateCallback, CallStateEngine, EngineBuilder};
pub use error::{ConfigError, EngineError, Result};
pub use reducer::{reduce, Reducer, UNREGISTERED_PRIORITY};
pub use state::{CallState, CallType};

// Re-export the probe vocabulary engine users need
pub use callwatch_probe::{
    Activity, CallTypeHint, Observation, Probe, ProbeCallback, ProbeRef, ProbeRegistration,
};
