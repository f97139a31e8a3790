use crate::state::GateState;

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("preference store unavailable: {0}")]
    Unavailable(String),
    #[error("preference '{key}' is not a boolean")]
    TypeMismatch { key: String },
    #[error("preference store corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("gate already entered (state: {0})")]
    AlreadyEntered(GateState),
    #[error("host context destroyed before the gate was entered")]
    HostDestroyed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("malformed extra '{0}', expected KEY=VALUE")]
    MalformedExtra(String),
    #[error("unknown auth outcome '{0}'")]
    UnknownOutcome(String),
}
