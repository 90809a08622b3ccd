//! Secret handles and content

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Peer relation endpoint shared by all units of the application
pub const PEER_RELATION: &str = "charm-peer";

/// Peer data key holding the id of the shared secret
pub const SECRET_ID_KEY: &str = "secret-id";

/// Value written by `pseudo-delete-secrets` in place of removing a key
pub const TOMBSTONE: &str = "### DELETED ###";

/// Full payload of one secret revision, ordered by key
pub type SecretContent = BTreeMap<String, String>;

static CONTENT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z](?:-?[a-z0-9]){2,})$").expect("static regex is valid"));

/// Opaque identifier of a secret held by the backing store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHandle(String);

impl SecretHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SecretHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SecretHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Reasons a secret payload is refused before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("secret content must not be empty")]
    Empty,

    #[error("invalid secret key {0:?}: keys are lowercase letters, digits and single hyphens, at least 3 characters, starting with a letter")]
    InvalidKey(String),
}

/// Check a payload against the host's rules for secret content.
///
/// Content must carry at least one key, and every key must match
/// `^([a-z](?:-?[a-z0-9]){2,})$`.
pub fn validate_content(content: &SecretContent) -> Result<(), ContentError> {
    if content.is_empty() {
        return Err(ContentError::Empty);
    }
    match content.keys().find(|key| !CONTENT_KEY.is_match(key)) {
        Some(key) => Err(ContentError::InvalidKey(key.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(pairs: &[(&str, &str)]) -> SecretContent {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_valid_keys() {
        let c = content(&[("key0", "value0"), ("user", "alice"), ("db-pass-2", "x")]);
        assert!(validate_content(&c).is_ok());
    }

    #[test]
    fn test_empty_content_rejected() {
        assert_eq!(validate_content(&SecretContent::new()), Err(ContentError::Empty));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        for key in ["ab", "Key0", "0key", "key--x", "key-", "key_0"] {
            let result = validate_content(&content(&[(key, "v")]));
            assert_eq!(result, Err(ContentError::InvalidKey(key.to_string())), "{key}");
        }
    }

    #[test]
    fn test_handle_display_roundtrip() {
        let handle = SecretHandle::new("secret:cj2a3ab5cvd2ve0g8ei0");
        assert_eq!(handle.to_string(), "secret:cj2a3ab5cvd2ve0g8ei0");
        assert_eq!(handle.as_str(), "secret:cj2a3ab5cvd2ve0g8ei0");

        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"secret:cj2a3ab5cvd2ve0g8ei0\"");
    }
}
