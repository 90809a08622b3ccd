//! In-memory ephemeral backends

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use secrets_test_core::{validate_content, SecretContent, SecretHandle};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::traits::{PeerData, SecretStore, StoreError};

/// One stored revision of a secret
#[derive(Debug, Clone)]
pub struct SecretRevision {
    /// Revision number, starting at 1
    pub revision: u32,
    pub content: SecretContent,
    pub created_date: DateTime<Utc>,
}

/// A secret with all of its revisions
#[derive(Debug, Clone)]
struct StoredSecret {
    revisions: Vec<SecretRevision>,
}

impl StoredSecret {
    fn latest(&self) -> Option<&SecretRevision> {
        self.revisions.last()
    }

    fn next_revision(&self) -> u32 {
        self.latest().map_or(1, |r| r.revision + 1)
    }
}

/// Ephemeral (in-memory) secret store
#[derive(Debug, Default)]
pub struct EphemeralSecretStore {
    secrets: DashMap<SecretHandle, StoredSecret>,
}

impl EphemeralSecretStore {
    pub fn new() -> Self {
        Self {
            secrets: DashMap::new(),
        }
    }

    /// All revisions of a secret, oldest first
    pub fn revisions(&self, handle: &SecretHandle) -> Option<Vec<SecretRevision>> {
        self.secrets.get(handle).map(|s| s.revisions.clone())
    }

    pub fn contains(&self, handle: &SecretHandle) -> bool {
        self.secrets.contains_key(handle)
    }

    /// Number of live secrets
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    fn new_handle() -> SecretHandle {
        SecretHandle::new(format!("secret:{}", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl SecretStore for EphemeralSecretStore {
    async fn create(&self, content: &SecretContent) -> Result<SecretHandle, StoreError> {
        validate_content(content)?;

        let handle = Self::new_handle();
        let secret = StoredSecret {
            revisions: vec![SecretRevision {
                revision: 1,
                content: content.clone(),
                created_date: Utc::now(),
            }],
        };
        self.secrets.insert(handle.clone(), secret);

        debug!(secret_id = %handle, keys = content.len(), "Created secret");
        Ok(handle)
    }

    async fn fetch(&self, handle: &SecretHandle) -> Result<SecretContent, StoreError> {
        self.secrets
            .get(handle)
            .and_then(|s| s.latest().map(|r| r.content.clone()))
            .ok_or_else(|| StoreError::NotFound(handle.clone()))
    }

    async fn update(
        &self,
        handle: &SecretHandle,
        content: &SecretContent,
    ) -> Result<(), StoreError> {
        validate_content(content)?;

        let mut secret = self
            .secrets
            .get_mut(handle)
            .ok_or_else(|| StoreError::NotFound(handle.clone()))?;

        let revision = secret.next_revision();
        secret.revisions.push(SecretRevision {
            revision,
            content: content.clone(),
            created_date: Utc::now(),
        });

        debug!(secret_id = %handle, revision, "Stored new secret revision");
        Ok(())
    }

    async fn remove_all_revisions(&self, handle: &SecretHandle) -> Result<(), StoreError> {
        self.secrets
            .remove(handle)
            .map(|(_, removed)| {
                debug!(
                    secret_id = %handle,
                    revisions = removed.revisions.len(),
                    "Removed all secret revisions"
                );
            })
            .ok_or_else(|| StoreError::NotFound(handle.clone()))
    }
}

/// Ephemeral application peer data
///
/// A detached instance behaves like a unit whose peer relation has not been
/// established yet: reads see nothing and writes are dropped.
#[derive(Debug)]
pub struct EphemeralPeerData {
    data: RwLock<HashMap<String, String>>,
    joined: bool,
}

impl Default for EphemeralPeerData {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralPeerData {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            joined: true,
        }
    }

    /// Peer data for a unit with no peer relation
    pub fn detached() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            joined: false,
        }
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }
}

#[async_trait]
impl PeerData for EphemeralPeerData {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if !self.joined {
            warn!(key = %key, "No peer relation, dropping peer data write");
            return Ok(());
        }
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if !self.joined {
            warn!(key = %key, "No peer relation, dropping peer data delete");
            return Ok(());
        }
        self.data.write().remove(key);
        Ok(())
    }
}
