//! Backend traits

use async_trait::async_trait;
use secrets_test_core::{CharmError, ContentError, ErrorCode, SecretContent, SecretHandle};
use thiserror::Error;

/// Errors from secret store and peer data operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Secret not found: {0}")]
    NotFound(SecretHandle),

    #[error("Invalid secret content: {0}")]
    InvalidContent(#[from] ContentError),

    #[error("{tool} failed with {status}: {stderr}")]
    HookTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed hook tool output: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for CharmError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidContent(content) => content.into(),
            other => CharmError::new(ErrorCode::BackendFailure, other.to_string()),
        }
    }
}

/// The host's secret backend
///
/// Each `update` stores a new revision; `remove_all_revisions` deletes the
/// secret for good.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Create a secret holding `content` and return its handle
    async fn create(&self, content: &SecretContent) -> Result<SecretHandle, StoreError>;

    /// Fetch the latest revision's content
    async fn fetch(&self, handle: &SecretHandle) -> Result<SecretContent, StoreError>;

    /// Replace the content with a new revision
    async fn update(&self, handle: &SecretHandle, content: &SecretContent)
        -> Result<(), StoreError>;

    /// Remove every revision of the secret
    async fn remove_all_revisions(&self, handle: &SecretHandle) -> Result<(), StoreError>;
}

/// Application-scoped peer relation data, replicated to every unit
#[async_trait]
pub trait PeerData: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
