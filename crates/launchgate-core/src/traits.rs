use std::time::Duration;

use crate::errors::PreferenceError;
use crate::types::{AuthOutcome, Destination};

/// Completion callback handed to an [`Authenticator`]. Called zero or more
/// times with `Retry`, then once with a terminal outcome.
pub type AuthCallback = Box<dyn FnMut(AuthOutcome)>;

/// A deferred unit of work run on the event loop.
pub type Task = Box<dyn FnOnce()>;

/// Key/value preference storage the auth policy lives in.
pub trait PreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError>;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError>;
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// Runs a biometric or device-credential challenge.
///
/// Must return without blocking and deliver outcomes on the caller's
/// event loop.
pub trait Authenticator {
    fn authenticate(&self, callback: AuthCallback);
}

/// Starts a destination screen. Fire-and-forget.
pub trait Navigator {
    fn launch(&self, destination: &Destination);
}

/// Defers a task on the same thread's event loop.
pub trait Scheduler {
    fn schedule_after(&self, delay: Duration, task: Task);
}

/// The UI context hosting the gate.
pub trait GateHost {
    /// Close the gate's own screen.
    fn finish(&self);
    /// True once the hosting context has been torn down.
    fn is_destroyed(&self) -> bool;
}
