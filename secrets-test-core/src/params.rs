//! Action parameters as delivered by `action-get --format=json`

use serde_json::{Map, Value};

use crate::content::SecretContent;
use crate::error::CharmError;

/// Parameter mapping of one action invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionParams {
    values: Map<String, Value>,
}

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a decoded JSON document; anything but an object is refused
    pub fn from_value(value: Value) -> Result<Self, CharmError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            // `action-get` prints `null` when the action declares no params
            Value::Null => Ok(Self::default()),
            other => Err(CharmError::invalid_parameter(format!(
                "action parameters must be a mapping, got {other}"
            ))),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CharmError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| CharmError::invalid_parameter(format!("malformed parameters: {e}")))?;
        Self::from_value(value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Read a required list of strings, e.g. the `keys` of `delete-secrets`
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, CharmError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| CharmError::invalid_parameter(format!("missing parameter {key:?}")))?;

        let Value::Array(items) = value else {
            return Err(CharmError::invalid_parameter(format!(
                "parameter {key:?} must be a list of strings"
            )));
        };

        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(CharmError::invalid_parameter(format!(
                    "parameter {key:?} contains non-string item {other}"
                ))),
            })
            .collect()
    }

    /// Treat every parameter as one key/value pair of secret content
    pub fn into_content(self) -> Result<SecretContent, CharmError> {
        self.values
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key, s)),
                other => Err(CharmError::invalid_parameter(format!(
                    "value of {key:?} must be a string, got {other}"
                ))),
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let params = ActionParams::from_json(r#"{"keys": ["key0", "key1"]}"#).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.string_list("keys").unwrap(), vec!["key0", "key1"]);
    }

    #[test]
    fn test_from_json_empty_and_null() {
        assert!(ActionParams::from_json("").unwrap().is_empty());
        assert!(ActionParams::from_json("null\n").unwrap().is_empty());
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        let err = ActionParams::from_json("42").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_string_list_errors() {
        let params = ActionParams::new().with("keys", "key0");
        assert_eq!(
            params.string_list("keys").unwrap_err().code,
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            params.string_list("other").unwrap_err().code,
            ErrorCode::InvalidParameter
        );

        let params = ActionParams::new().with("keys", json!(["key0", 1]));
        assert!(params.string_list("keys").is_err());
    }

    #[test]
    fn test_into_content() {
        let content = ActionParams::new()
            .with("user", "alice")
            .with("pass", "s3cr3t")
            .into_content()
            .unwrap();
        assert_eq!(content.get("user").map(String::as_str), Some("alice"));
        assert_eq!(content.len(), 2);

        let err = ActionParams::new().with("port", 5432).into_content().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }
}
