use std::cell::Cell;

use launchgate_core::traits::GateHost;

/// In-process stand-in for the screen hosting the gate.
#[derive(Debug, Default)]
pub struct HostContext {
    finished: Cell<bool>,
    destroyed: Cell<bool>,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    /// Tear the context down. Pending gate callbacks become no-ops.
    pub fn destroy(&self) {
        self.destroyed.set(true);
    }
}

impl GateHost for HostContext {
    fn finish(&self) {
        self.finished.set(true);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}
