//! Maps a probe outcome to a health state and detects transitions.
//!
//! Per-check state machine:
//!
//! | From          | Outcome  | To   | Alert |
//! |---------------|----------|------|-------|
//! | never checked | any      | up/down | no |
//! | up            | down     | down | yes   |
//! | down          | up       | up   | yes   |
//! | up / down     | same     | same | no    |

use crate::check::{CheckDefinition, CheckRuntimeState, HealthState};
use crate::outcome::ProbeOutcome;
use crate::types::UnixMillis;

/// Result of evaluating one probe outcome against a check's prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// State to persist (`lastChecked` is always set).
    pub runtime: CheckRuntimeState,
    /// Whether the change is worth alerting on.
    pub transition: bool,
}

/// `up` iff the probe got a response whose code is acceptable.
pub fn compute_state(definition: &CheckDefinition, outcome: &ProbeOutcome) -> HealthState {
    match outcome.response_code() {
        Some(code) if definition.accepts(code) => HealthState::Up,
        _ => HealthState::Down,
    }
}

/// Evaluate `outcome` at time `now`.
///
/// A transition exists only when the check had been evaluated before and its
/// persisted state differs from the computed one.
pub fn evaluate(
    definition: &CheckDefinition,
    prior: &CheckRuntimeState,
    outcome: &ProbeOutcome,
    now: UnixMillis,
) -> Evaluation {
    let state = compute_state(definition, outcome);
    let transition = prior.last_checked.is_some() && prior.state != state;
    Evaluation {
        runtime: CheckRuntimeState {
            state,
            last_checked: Some(now),
        },
        transition,
    }
}
