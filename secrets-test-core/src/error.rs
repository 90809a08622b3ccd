//! Charm error types and formatting

use thiserror::Error;

use crate::content::ContentError;

/// Error codes reported back through `action-fail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Dispatch
    UnknownAction,
    UnknownEvent,

    // Parameters and content
    InvalidParameter,
    InvalidContent,

    // Anything the host-side secret backend or relation store refused
    BackendFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownAction => "UnknownAction",
            Self::UnknownEvent => "UnknownEvent",
            Self::InvalidParameter => "InvalidParameter",
            Self::InvalidContent => "InvalidContent",
            Self::BackendFailure => "BackendFailure",
        }
    }

    /// Whether the caller can fix the failure by changing the request
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::BackendFailure)
    }
}

/// Error raised while handling a hook or action
#[derive(Debug, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct CharmError {
    pub code: ErrorCode,
    pub message: String,
    pub action: Option<String>,
}

impl CharmError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            action: None,
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendFailure, message)
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Message handed to `action-fail`
    pub fn to_failure_message(&self) -> String {
        match &self.action {
            Some(action) => format!("{action} failed ({}): {}", self.code.as_str(), self.message),
            None => format!("{}: {}", self.code.as_str(), self.message),
        }
    }
}

impl From<ContentError> for CharmError {
    fn from(err: ContentError) -> Self {
        Self::new(ErrorCode::InvalidContent, err.to_string())
    }
}
