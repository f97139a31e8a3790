use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::InvocationError;

/// Result of one authentication attempt, delivered through the
/// authenticator callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    Success,
    /// No usable biometric hardware or credential is enrolled.
    HardwareUnavailable,
    Failure,
    Cancelled,
    /// Transient; the authenticator is still running and will call back again.
    Retry,
}

impl AuthOutcome {
    /// Terminal outcomes end the attempt. Only `Retry` does not.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AuthOutcome::Retry)
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthOutcome::Success => "success",
            AuthOutcome::HardwareUnavailable => "hardware_unavailable",
            AuthOutcome::Failure => "failure",
            AuthOutcome::Cancelled => "cancelled",
            AuthOutcome::Retry => "retry",
        };
        f.write_str(s)
    }
}

impl FromStr for AuthOutcome {
    type Err = InvocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(AuthOutcome::Success),
            "hardware_unavailable" | "unavailable" => Ok(AuthOutcome::HardwareUnavailable),
            "failure" | "fail" => Ok(AuthOutcome::Failure),
            "cancelled" | "canceled" | "cancel" => Ok(AuthOutcome::Cancelled),
            "retry" => Ok(AuthOutcome::Retry),
            other => Err(InvocationError::UnknownOutcome(other.to_string())),
        }
    }
}

/// Screen the gate hands control to once it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Destination {
    DecryptScreen {
        file_path: Option<String>,
        repo_path: Option<String>,
    },
    MainScreen,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::DecryptScreen {
                file_path,
                repo_path,
            } => write!(
                f,
                "decrypt({}, repo={})",
                file_path.as_deref().unwrap_or("<none>"),
                repo_path.as_deref().unwrap_or("<none>")
            ),
            Destination::MainScreen => f.write_str("main"),
        }
    }
}
