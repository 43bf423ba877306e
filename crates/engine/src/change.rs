//! Emission gating.

use crate::state::CallState;

/// Whether `next` differs from the last emitted state.
pub fn should_emit(previous: &CallState, next: &CallState) -> bool {
    previous != next
}
