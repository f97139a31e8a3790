use std::time::Duration;

use launchgate_core::invocation::{Action, Invocation};
use launchgate_core::types::Destination;
use serde::{Deserialize, Serialize};

/// Delay before the gate closes after an authenticated dispatch.
pub const DEFAULT_TERMINATION_DELAY_MS: u64 = 500;

/// Tunables for a gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_termination_delay_ms")]
    pub termination_delay_ms: u64,
}

fn default_termination_delay_ms() -> u64 {
    DEFAULT_TERMINATION_DELAY_MS
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            termination_delay_ms: DEFAULT_TERMINATION_DELAY_MS,
        }
    }
}

impl GateConfig {
    /// Delay between launching the destination and closing the gate.
    /// Zero when no challenge was shown.
    pub fn termination_delay(&self, skip_delay: bool) -> Duration {
        if skip_delay {
            Duration::ZERO
        } else {
            Duration::from_millis(self.termination_delay_ms)
        }
    }
}

/// Pick the screen for an invocation.
///
/// Decrypt requests forward both paths as-is, absent or not. Every other
/// action opens the main screen and ignores the path extras.
pub fn resolve_destination(invocation: &Invocation) -> Destination {
    match invocation.action {
        Action::DecryptRequested => Destination::DecryptScreen {
            file_path: invocation.file_path.clone(),
            repo_path: invocation.repo_path.clone(),
        },
        Action::Default => Destination::MainScreen,
    }
}
