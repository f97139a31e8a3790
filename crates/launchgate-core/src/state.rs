use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AuthOutcome;

/// Lifecycle of a single gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Idle,
    AwaitingAuth,
    Dispatching,
    Terminated,
}

impl GateState {
    /// Whether `self -> next` is an edge of the gate's state machine.
    ///
    /// `AwaitingAuth -> AwaitingAuth` is the retry self-loop. Nothing
    /// leaves `Terminated`.
    pub fn permits(self, next: GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (Idle, Dispatching)
                | (Idle, AwaitingAuth)
                | (AwaitingAuth, AwaitingAuth)
                | (AwaitingAuth, Dispatching)
                | (AwaitingAuth, Terminated)
                | (Dispatching, Terminated)
        )
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateState::Idle => "idle",
            GateState::AwaitingAuth => "awaiting_auth",
            GateState::Dispatching => "dispatching",
            GateState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// What caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "outcome", rename_all = "snake_case")]
pub enum Trigger {
    PolicyDisabled,
    PolicyEnabled,
    Outcome(AuthOutcome),
    TerminationTimer,
}

/// One recorded edge of a gate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: GateState,
    pub to: GateState,
    pub trigger: Trigger,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GateState; 4] = [
        GateState::Idle,
        GateState::AwaitingAuth,
        GateState::Dispatching,
        GateState::Terminated,
    ];

    #[test]
    fn terminated_is_absorbing() {
        for next in ALL {
            assert!(!GateState::Terminated.permits(next), "terminated -> {next}");
        }
    }

    #[test]
    fn idle_cannot_terminate_directly() {
        assert!(!GateState::Idle.permits(GateState::Terminated));
        assert!(!GateState::Idle.permits(GateState::Idle));
    }

    #[test]
    fn dispatching_only_terminates() {
        for next in ALL {
            assert_eq!(
                GateState::Dispatching.permits(next),
                next == GateState::Terminated
            );
        }
    }

    #[test]
    fn awaiting_auth_allows_retry_loop() {
        assert!(GateState::AwaitingAuth.permits(GateState::AwaitingAuth));
        assert!(!GateState::AwaitingAuth.permits(GateState::Idle));
    }

    #[test]
    fn trigger_serializes_with_outcome() {
        let v = serde_json::to_value(Trigger::Outcome(AuthOutcome::Retry)).unwrap();
        assert_eq!(v["kind"], "outcome");
        assert_eq!(v["outcome"], "retry");
        let v = serde_json::to_value(Trigger::PolicyDisabled).unwrap();
        assert_eq!(v["kind"], "policy_disabled");
    }
}
