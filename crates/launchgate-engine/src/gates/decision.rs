use chrono::{DateTime, Utc};
use launchgate_core::invocation::Invocation;
use launchgate_core::state::{GateState, TransitionRecord};
use launchgate_core::types::Destination;
use serde::{Deserialize, Serialize};

/// Snapshot of one gate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    pub invocation: Invocation,
    pub state: GateState,
    pub destination: Option<Destination>,
    /// Termination delay scheduled after dispatch, if dispatch happened.
    pub termination_delay_ms: Option<u64>,
    pub policy_cleared: bool,
    pub host_finished: bool,
    pub transitions: Vec<TransitionRecord>,
    pub entered_at: Option<DateTime<Utc>>,
}

impl GateReport {
    /// True when the run reached a destination.
    pub fn granted(&self) -> bool {
        self.destination.is_some()
    }
}
