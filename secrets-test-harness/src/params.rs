//! Builders for action parameters

use secrets_test_core::ActionParams;
use serde_json::{json, Value};

/// `{"keys": [...]}`, as taken by `delete-secrets` and `pseudo-delete-secrets`
pub fn keys(keys: &[&str]) -> ActionParams {
    ActionParams::new().with("keys", json!(keys))
}

/// Arbitrary key/value content for `set-secret`
pub fn content(pairs: &[(&str, &str)]) -> ActionParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
        .collect()
}

/// `key0=value0 .. key{n-1}=value{n-1}`
pub fn numbered_content(count: usize) -> ActionParams {
    (0..count)
        .map(|i| (format!("key{i}"), Value::from(format!("value{i}"))))
        .collect()
}

/// `["key0", .., "key{n-1}"]` filtered by `pick`
pub fn numbered_keys(count: usize, pick: impl Fn(usize) -> bool) -> ActionParams {
    let keys: Vec<String> = (0..count).filter(|i| pick(*i)).map(|i| format!("key{i}")).collect();
    ActionParams::new().with("keys", json!(keys))
}
