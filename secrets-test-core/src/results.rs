//! Structured action results
//!
//! The host only accepts flat `key=value` pairs from `action-set`, so nested
//! mappings are flattened into dotted keys. Empty values and empty mappings
//! never make it into the result.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::content::SecretContent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum ResultValue {
    Text(String),
    Map(BTreeMap<String, ResultValue>),
}

/// Result payload of one action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionResults {
    values: BTreeMap<String, ResultValue>,
}

impl ActionResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), ResultValue::Text(value.into()));
        self
    }

    pub fn with_content(mut self, key: impl Into<String>, content: &SecretContent) -> Self {
        let nested = content
            .iter()
            .map(|(k, v)| (k.clone(), ResultValue::Text(v.clone())))
            .collect();
        self.values.insert(key.into(), ResultValue::Map(nested));
        self
    }

    /// Flatten to the `key=value` pairs passed to `action-set`
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        flatten_into(&mut out, None, &self.values);
        out
    }

    /// True if nothing would be reported
    pub fn is_empty(&self) -> bool {
        self.flatten().is_empty()
    }

    /// Arguments for a single `action-set` invocation
    pub fn to_args(&self) -> Vec<String> {
        self.flatten()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect()
    }
}

fn flatten_into(
    out: &mut BTreeMap<String, String>,
    prefix: Option<&str>,
    values: &BTreeMap<String, ResultValue>,
) {
    for (key, value) in values {
        let full_key = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            ResultValue::Text(text) if text.is_empty() => {}
            ResultValue::Text(text) => {
                out.insert(full_key, text.clone());
            }
            ResultValue::Map(nested) => flatten_into(out, Some(&full_key), nested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested_content() {
        let mut content = SecretContent::new();
        content.insert("key0".to_string(), "value0".to_string());
        content.insert("key1".to_string(), "value1".to_string());

        let results = ActionResults::new().with_content("secrets", &content);
        let flat = results.flatten();

        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get("secrets.key0").map(String::as_str), Some("value0"));
        assert_eq!(results.to_args(), vec!["secrets.key0=value0", "secrets.key1=value1"]);
    }

    #[test]
    fn test_empty_values_are_dropped() {
        let results = ActionResults::new()
            .with_content("secrets", &SecretContent::new())
            .with_value("note", "");
        assert!(results.is_empty());
        assert!(results.to_args().is_empty());
    }

    #[test]
    fn test_plain_value() {
        let results = ActionResults::new().with_value("secret-id", "secret:abc");
        assert_eq!(results.to_args(), vec!["secret-id=secret:abc"]);

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["secret-id"], "secret:abc");
    }
}
