//! Reduction of probe observations into one call state.
//!
//! Pure domain logic - no I/O, no threads.

use crate::config::ReductionPolicy;
use crate::state::{CallState, CallType};
use callwatch_probe::{CallTypeHint, Observation, ProbeRegistration};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Priority assumed for observations from unregistered sources.
pub const UNREGISTERED_PRIORITY: i32 = 0;

/// Combine the latest observation of every probe.
///
/// Rules:
/// 1. Active if any observation is `Active`.
/// 2. Inactive means `CallType::None`.
/// 3. Otherwise walk the active observations by priority (highest first,
///    then `source_id` ascending) and take the first known hint; if none
///    is known, use `policy.default_call_type`.
pub fn reduce(
    observations: &HashMap<String, Observation>,
    priorities: &HashMap<String, i32>,
    policy: &ReductionPolicy,
) -> CallState {
    let mut active: Vec<(i32, &str, CallTypeHint)> = observations
        .iter()
        .filter(|(_, obs)| obs.is_active())
        .map(|(source_id, obs)| {
            let priority = priorities
                .get(source_id)
                .copied()
                .unwrap_or(UNREGISTERED_PRIORITY);
            (priority, source_id.as_str(), obs.call_type_hint)
        })
        .collect();

    if active.is_empty() {
        return CallState::IDLE;
    }

    active.sort_by_key(|&(priority, source_id, _)| (Reverse(priority), source_id));

    let call_type = active
        .iter()
        .find_map(|&(_, _, hint)| call_type_for(hint))
        .unwrap_or(policy.default_call_type);

    CallState::new(call_type)
}

fn call_type_for(hint: CallTypeHint) -> Option<CallType> {
    match hint {
        CallTypeHint::Voice => Some(CallType::PhoneCall),
        CallTypeHint::Video => Some(CallType::VideoCall),
        CallTypeHint::Unknown => None,
    }
}

/// Reducer bound to a set of probe registrations and a policy.
#[derive(Debug, Clone, Default)]
pub struct Reducer {
    priorities: HashMap<String, i32>,
    policy: ReductionPolicy,
}

impl Reducer {
    pub fn new(policy: ReductionPolicy) -> Self {
        Self {
            priorities: HashMap::new(),
            policy,
        }
    }

    pub fn register(&mut self, registration: &ProbeRegistration) {
        self.priorities
            .insert(registration.id.clone(), registration.priority);
    }

    pub fn reduce(&self, observations: &HashMap<String, Observation>) -> CallState {
        let policy = self.policy;
        // `default_call_type` is validated up front, but keep the invariant
        // even for a hand-built policy.
        let policy = if policy.default_call_type == CallType::None {
            ReductionPolicy::default()
        } else {
            policy
        };
        reduce(observations, &self.priorities, &policy)
    }
}
