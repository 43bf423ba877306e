//! Error types for engine construction.
//!
//! Runtime failures never surface here; probes absorb them into `Unknown`
//! observations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error("default call type must describe an active call, not `none`")]
    InactiveDefaultCallType,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("a probe with id `{0}` is already registered")]
    DuplicateProbe(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
