use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::InvocationError;
use crate::keys::{ACTION_DECRYPT_PASS, EXTRA_FILE_PATH, EXTRA_REPO_PATH};

/// What the caller asked the application to do on launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    DecryptRequested,
    #[default]
    Default,
}

impl Action {
    /// Map a raw action tag. Only `DECRYPT_PASS` is recognised; anything
    /// else, including no tag at all, is `Default`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(ACTION_DECRYPT_PASS) => Action::DecryptRequested,
            _ => Action::Default,
        }
    }
}

/// The request that started the application.
///
/// Path extras are kept exactly as received. They are only read when
/// `action` is `DecryptRequested`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Invocation {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
}

impl Invocation {
    pub fn main() -> Self {
        Self::default()
    }

    pub fn decrypt(file_path: impl Into<String>, repo_path: impl Into<String>) -> Self {
        Self {
            action: Action::DecryptRequested,
            file_path: Some(file_path.into()),
            repo_path: Some(repo_path.into()),
        }
    }

    /// Build from an action tag plus string extras as delivered by the shell.
    pub fn from_intent(action: Option<&str>, extras: &HashMap<String, String>) -> Self {
        Self {
            action: Action::from_tag(action),
            file_path: extras.get(EXTRA_FILE_PATH).cloned(),
            repo_path: extras.get(EXTRA_REPO_PATH).cloned(),
        }
    }
}

/// Parse a `KEY=VALUE` extra. The value may itself contain `=`.
pub fn parse_extra(raw: &str) -> Result<(String, String), InvocationError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| InvocationError::MalformedExtra(raw.to_string()))?;
    if key.trim().is_empty() {
        return Err(InvocationError::MalformedExtra(raw.to_string()));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extras(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decrypt_tag_selects_decrypt_action() {
        assert_eq!(Action::from_tag(Some("DECRYPT_PASS")), Action::DecryptRequested);
    }

    #[test]
    fn other_tags_fall_back_to_default() {
        assert_eq!(Action::from_tag(None), Action::Default);
        assert_eq!(Action::from_tag(Some("")), Action::Default);
        assert_eq!(Action::from_tag(Some("decrypt_pass")), Action::Default);
        assert_eq!(Action::from_tag(Some("android.intent.action.MAIN")), Action::Default);
    }

    #[test]
    fn from_intent_reads_path_extras() {
        let inv = Invocation::from_intent(
            Some("DECRYPT_PASS"),
            &extras(&[("FILE_PATH", "/a/b.gpg"), ("REPO_PATH", "/repo")]),
        );
        assert_eq!(inv, Invocation::decrypt("/a/b.gpg", "/repo"));
    }

    #[test]
    fn from_intent_keeps_missing_extras_absent() {
        let inv = Invocation::from_intent(Some("DECRYPT_PASS"), &extras(&[("FILE_PATH", "/x")]));
        assert_eq!(inv.action, Action::DecryptRequested);
        assert_eq!(inv.file_path.as_deref(), Some("/x"));
        assert!(inv.repo_path.is_none());
    }

    #[test]
    fn parse_extra_splits_on_first_equals() {
        let (k, v) = parse_extra("FILE_PATH=/a/b=c.gpg").unwrap();
        assert_eq!(k, "FILE_PATH");
        assert_eq!(v, "/a/b=c.gpg");
    }

    #[test]
    fn parse_extra_rejects_missing_key_or_separator() {
        assert!(parse_extra("FILE_PATH").is_err());
        assert!(parse_extra("=value").is_err());
    }
}
