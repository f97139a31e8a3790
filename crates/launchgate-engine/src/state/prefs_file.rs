use std::path::PathBuf;

use anyhow::Context;
use launchgate_core::errors::PreferenceError;
use launchgate_core::traits::PreferenceStore;
use serde_json::{Map, Value};
use tracing::debug;

use super::atomic::{atomic_write, PrefsLock};

/// Preferences kept as one flat JSON object on disk, for the `lgate` CLI.
///
/// A missing file reads as an empty store. Every mutation takes the
/// advisory lock, re-reads the file, and writes it back atomically.
#[derive(Debug, Clone)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All stored entries.
    pub fn entries(&self) -> Result<Map<String, Value>, PreferenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(PreferenceError::Unavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PreferenceError::Corrupt(format!(
                "{}: expected a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(PreferenceError::Corrupt(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn mutate(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<(), PreferenceError> {
        let _lock = PrefsLock::acquire(&self.path)
            .map_err(|e| PreferenceError::Unavailable(format!("{e:#}")))?;
        let mut map = self.entries()?;
        apply(&mut map);
        serde_json::to_string_pretty(&Value::Object(map))
            .context("cannot serialize preferences")
            .and_then(|json| atomic_write(&self.path, json.as_bytes()))
            .map_err(|e| PreferenceError::Unavailable(format!("{e:#}")))
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        match self.entries()?.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(PreferenceError::TypeMismatch {
                key: key.to_string(),
            }),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        debug!(key, value, path = %self.path.display(), "writing preference");
        self.mutate(|map| {
            map.insert(key.to_string(), Value::Bool(value));
        })
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        debug!(key, path = %self.path.display(), "removing preference");
        self.mutate(|map| {
            map.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchgate_core::keys::BIOMETRIC_AUTH;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPreferenceStore::open(dir.path().join("prefs.json"));
        assert_eq!(store.get_bool(BIOMETRIC_AUTH).unwrap(), None);
    }

    #[test]
    fn set_then_remove_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = JsonPreferenceStore::open(&path);

        store.set_bool(BIOMETRIC_AUTH, true).unwrap();
        let reopened = JsonPreferenceStore::open(&path);
        assert_eq!(reopened.get_bool(BIOMETRIC_AUTH).unwrap(), Some(true));

        reopened.remove(BIOMETRIC_AUTH).unwrap();
        assert_eq!(store.get_bool(BIOMETRIC_AUTH).unwrap(), None);
        assert!(!dir.path().join("prefs.json.lock").exists());
    }

    #[test]
    fn remove_keeps_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"biometric_auth": true, "theme": "dark"}"#).unwrap();

        let store = JsonPreferenceStore::open(&path);
        store.remove(BIOMETRIC_AUTH).unwrap();

        let entries = store.entries().unwrap();
        assert!(!entries.contains_key(BIOMETRIC_AUTH));
        assert_eq!(entries["theme"], "dark");
    }

    #[test]
    fn non_boolean_value_is_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"biometric_auth": "yes"}"#).unwrap();

        let err = JsonPreferenceStore::open(&path)
            .get_bool(BIOMETRIC_AUTH)
            .unwrap_err();
        assert!(matches!(err, PreferenceError::TypeMismatch { .. }));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = JsonPreferenceStore::open(&path)
            .get_bool(BIOMETRIC_AUTH)
            .unwrap_err();
        assert!(matches!(err, PreferenceError::Corrupt(_)));

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = JsonPreferenceStore::open(&path).entries().unwrap_err();
        assert!(matches!(err, PreferenceError::Corrupt(_)));
    }
}
