//! Authoritative call state.

use serde::{Deserialize, Serialize};

/// Categorical call type reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CallType {
    #[default]
    None,
    PhoneCall,
    VideoCall,
}

impl CallType {
    pub fn label(&self) -> &'static str {
        match self {
            CallType::None => "none",
            CallType::PhoneCall => "phoneCall",
            CallType::VideoCall => "videoCall",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether a call is active and of which kind.
///
/// `call_type() == CallType::None` iff `!is_active()`. The fields are private
/// so the invariant holds for every value, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", try_from = "RawCallState")]
pub struct CallState {
    #[serde(rename = "isCallActive")]
    active: bool,
    call_type: CallType,
}

impl CallState {
    /// No call in progress.
    pub const IDLE: CallState = CallState {
        active: false,
        call_type: CallType::None,
    };

    /// State implied by a call type: active unless `CallType::None`.
    pub fn new(call_type: CallType) -> Self {
        Self {
            active: call_type != CallType::None,
            call_type,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }
}

impl From<CallType> for CallState {
    fn from(call_type: CallType) -> Self {
        Self::new(call_type)
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.active {
            write!(f, "active ({})", self.call_type)
        } else {
            write!(f, "idle")
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCallState {
    is_call_active: bool,
    call_type: CallType,
}

impl TryFrom<RawCallState> for CallState {
    type Error = String;

    fn try_from(raw: RawCallState) -> Result<Self, Self::Error> {
        let state = CallState::new(raw.call_type);
        if state.active != raw.is_call_active {
            return Err(format!(
                "isCallActive={} contradicts callType={}",
                raw.is_call_active, raw.call_type
            ));
        }
        Ok(state)
    }
}
