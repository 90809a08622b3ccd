//! Events delivered to the charm

use secrets_test_core::{CharmError, ErrorCode};
use std::fmt;
use std::str::FromStr;

/// A hook or action, as named by `JUJU_DISPATCH_PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Hook(String),
    Action(String),
}

impl Event {
    pub fn name(&self) -> &str {
        match self {
            Self::Hook(name) | Self::Action(name) => name,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}

impl FromStr for Event {
    type Err = CharmError;

    /// Parse `hooks/<name>` or `actions/<name>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s.trim().trim_matches('/').split_once('/').ok_or_else(|| {
            CharmError::new(ErrorCode::UnknownEvent, format!("unrecognised dispatch path {s:?}"))
        })?;

        if name.is_empty() || name.contains('/') {
            return Err(CharmError::new(
                ErrorCode::UnknownEvent,
                format!("unrecognised dispatch path {s:?}"),
            ));
        }

        match kind {
            "hooks" => Ok(Self::Hook(name.to_string())),
            "actions" => Ok(Self::Action(name.to_string())),
            _ => Err(CharmError::new(
                ErrorCode::UnknownEvent,
                format!("unknown event kind {kind:?} in {s:?}"),
            )),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hook(name) => write!(f, "hooks/{name}"),
            Self::Action(name) => write!(f, "actions/{name}"),
        }
    }
}
