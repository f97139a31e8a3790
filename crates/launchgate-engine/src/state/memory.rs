use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use launchgate_core::errors::PreferenceError;
use launchgate_core::traits::PreferenceStore;
use serde_json::Value;

/// Preference store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RefCell<BTreeMap<String, Value>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bool(key: &str, value: bool) -> Self {
        let store = Self::default();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), Value::Bool(value));
        store
    }

    /// Store an arbitrary JSON value, e.g. to simulate a mistyped entry.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    /// Make every read fail with `Unavailable`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make every write or removal fail with `Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        if self.fail_reads.get() {
            return Err(PreferenceError::Unavailable("reads disabled".into()));
        }
        match self.values.borrow().get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(PreferenceError::TypeMismatch {
                key: key.to_string(),
            }),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        if self.fail_writes.get() {
            return Err(PreferenceError::Unavailable("writes disabled".into()));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        if self.fail_writes.get() {
            return Err(PreferenceError::Unavailable("writes disabled".into()));
        }
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
