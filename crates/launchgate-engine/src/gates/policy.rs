use std::rc::Rc;

use launchgate_core::errors::PreferenceError;
use launchgate_core::keys::BIOMETRIC_AUTH;
use launchgate_core::traits::PreferenceStore;
use tracing::warn;

/// Handle on the biometric gating preference.
#[derive(Clone)]
pub struct AuthPolicy {
    store: Rc<dyn PreferenceStore>,
}

impl AuthPolicy {
    pub fn new(store: Rc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Whether launches must pass an authentication challenge.
    ///
    /// Absent means disabled. An unreadable store fails closed.
    pub fn is_enabled(&self) -> bool {
        match self.stored() {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "cannot read auth policy, requiring authentication");
                true
            }
        }
    }

    /// The raw stored flag, `None` when the key is absent.
    pub fn stored(&self) -> Result<Option<bool>, PreferenceError> {
        self.store.get_bool(BIOMETRIC_AUTH)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.store.set_bool(BIOMETRIC_AUTH, enabled)
    }

    /// Remove the stored preference so later launches skip the challenge.
    pub fn clear(&self) -> Result<(), PreferenceError> {
        self.store.remove(BIOMETRIC_AUTH)
    }
}
