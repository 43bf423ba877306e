//! Probe failure taxonomy.

use thiserror::Error;

/// Errors a probe's underlying reader can report.
///
/// Neither variant ever reaches the engine's subscriber; they only decide
/// what the probe's cached observation becomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The API is missing or access was denied. The probe degrades to a
    /// permanent `Unknown` observation.
    #[error("probe unavailable: {0}")]
    Unavailable(String),

    /// A single sample failed. The probe keeps its last good observation.
    #[error("transient read failure: {0}")]
    TransientRead(String),
}

impl ProbeError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ProbeError::Unavailable(reason.into())
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        ProbeError::TransientRead(reason.into())
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, ProbeError::Unavailable(_))
    }
}
