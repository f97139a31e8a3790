use std::cell::RefCell;

use launchgate_core::traits::Navigator;
use launchgate_core::types::Destination;
use tracing::info;

/// Navigator that records every launch instead of starting a screen.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    launched: RefCell<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launched(&self) -> Vec<Destination> {
        self.launched.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn launch(&self, destination: &Destination) {
        info!(%destination, "launching destination");
        self.launched.borrow_mut().push(destination.clone());
    }
}
