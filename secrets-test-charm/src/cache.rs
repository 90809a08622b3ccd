//! In-process mirror of the application's shared secret

use secrets_test_backend::{PeerData, SecretStore, StoreError};
use secrets_test_core::{SecretContent, SecretHandle, SECRET_ID_KEY};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache of the shared secret's content
///
/// The handle lives in the peer relation under `secret-id`; the content lives
/// in the secret store. Both are resolved lazily and written through on every
/// change. A process handles a single event, so the cache never outlives it.
pub struct SecretCache {
    store: Arc<dyn SecretStore>,
    peers: Arc<dyn PeerData>,
    secrets: SecretContent,
    handle: Option<SecretHandle>,
}

impl SecretCache {
    pub fn new(store: Arc<dyn SecretStore>, peers: Arc<dyn PeerData>) -> Self {
        Self {
            store,
            peers,
            secrets: SecretContent::new(),
            handle: None,
        }
    }

    /// Handle recorded in peer data, without checking the store
    pub async fn stored_handle(&self) -> Result<Option<SecretHandle>, StoreError> {
        Ok(self.peers.get(SECRET_ID_KEY).await?.map(SecretHandle::from))
    }

    /// Handle of the live secret, if any
    ///
    /// A handle whose secret the store no longer knows counts as no handle.
    pub async fn handle(&mut self) -> Result<Option<SecretHandle>, StoreError> {
        if self.handle.is_none() {
            self.resolve().await?;
        }
        Ok(self.handle.clone())
    }

    /// Look up the handle in peer data and load its content
    async fn resolve(&mut self) -> Result<(), StoreError> {
        let Some(handle) = self.stored_handle().await? else {
            return Ok(());
        };

        match self.store.fetch(&handle).await {
            Ok(content) => {
                debug!(secret_id = %handle, keys = content.len(), "Loaded secret");
                if self.secrets.is_empty() {
                    self.secrets = content;
                }
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(secret_id = %handle, "Peer data points at a secret that no longer exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Current content, fetched from the store on first use
    pub async fn get(&mut self) -> Result<&SecretContent, StoreError> {
        if self.secrets.is_empty() {
            match self.handle.clone() {
                Some(handle) => match self.store.fetch(&handle).await {
                    Ok(content) => self.secrets = content,
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                },
                None => self.resolve().await?,
            }
        }
        Ok(&self.secrets)
    }

    /// Merge `new_content` into the secret, creating it if there is none
    pub async fn set(&mut self, new_content: SecretContent) -> Result<SecretHandle, StoreError> {
        let existing = if self.get().await?.is_empty() {
            None
        } else {
            self.handle.clone()
        };

        if let Some(handle) = existing {
            let mut merged = self.secrets.clone();
            merged.extend(new_content);
            self.store.update(&handle, &merged).await?;
            self.secrets = merged;

            info!(
                secret_id = %handle,
                keys = ?self.secrets.keys().collect::<Vec<_>>(),
                "Set secret"
            );
            return Ok(handle);
        }

        let handle = self.store.create(&new_content).await?;
        self.peers.set(SECRET_ID_KEY, handle.as_str()).await?;
        self.secrets = new_content;
        self.handle = Some(handle.clone());

        info!(
            secret_id = %handle,
            keys = ?self.secrets.keys().collect::<Vec<_>>(),
            "Added secret"
        );
        Ok(handle)
    }

    /// Remove `key`; removing the last key deletes the secret altogether
    pub async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.get().await?.is_empty() {
            warn!(key = %key, "Can't delete any secrets as we have none defined");
        }

        self.secrets.remove(key);

        let Some(handle) = self.handle.clone() else {
            return Ok(());
        };
        info!(secret_id = %handle, key = %key, "Removing key from secret");

        if self.secrets.is_empty() {
            match self.store.remove_all_revisions(&handle).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(secret_id = %handle, "Secret was already removed");
                }
                Err(e) => return Err(e),
            }
            self.peers.delete(SECRET_ID_KEY).await?;
            self.handle = None;
            info!("No secrets remained");
        } else {
            self.store.update(&handle, &self.secrets).await?;
            info!(
                secret_id = %handle,
                remaining = ?self.secrets.keys().collect::<Vec<_>>(),
                "Remaining content"
            );
        }
        Ok(())
    }

    /// Drop the reference to the secret without touching its revisions
    pub async fn forget_all(&mut self) -> Result<(), StoreError> {
        self.peers.delete(SECRET_ID_KEY).await?;
        if let Some(handle) = self.handle.take() {
            info!(secret_id = %handle, "Forgot secret");
        }
        self.secrets.clear();
        Ok(())
    }
}

impl std::fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCache")
            .field("handle", &self.handle)
            .field("keys", &self.secrets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use secrets_test_backend::{EphemeralPeerData, EphemeralSecretStore};

    fn content(pairs: &[(&str, &str)]) -> SecretContent {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    struct Fixture {
        store: Arc<EphemeralSecretStore>,
        peers: Arc<EphemeralPeerData>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(EphemeralSecretStore::new()),
                peers: Arc::new(EphemeralPeerData::new()),
            }
        }

        /// A fresh cache, as a new event process would build it
        fn cache(&self) -> SecretCache {
            SecretCache::new(self.store.clone(), self.peers.clone())
        }

        fn peer_handle(&self) -> Option<String> {
            self.peers.snapshot().get(SECRET_ID_KEY).cloned()
        }
    }

    #[tokio::test]
    async fn test_get_without_secret_is_empty() {
        let fx = Fixture::new();
        let mut cache = fx.cache();
        assert!(cache.get().await.unwrap().is_empty());
        assert_eq!(cache.handle().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_secret_and_records_handle() {
        let fx = Fixture::new();
        let mut cache = fx.cache();

        let handle = cache.set(content(&[("user", "alice")])).await.unwrap();

        assert_eq!(fx.peer_handle().as_deref(), Some(handle.as_str()));
        assert!(fx.store.contains(&handle));
        assert_eq!(cache.get().await.unwrap(), &content(&[("user", "alice")]));
    }

    #[tokio::test]
    async fn test_set_merges_with_later_content_winning() {
        let fx = Fixture::new();
        let mut cache = fx.cache();

        let first = cache
            .set(content(&[("user", "alice"), ("role", "admin")]))
            .await
            .unwrap();
        let second = cache
            .set(content(&[("role", "reader"), ("pass", "s3cr3t")]))
            .await
            .unwrap();

        assert_eq!(first, second);
        let expected = content(&[("user", "alice"), ("role", "reader"), ("pass", "s3cr3t")]);
        assert_eq!(cache.get().await.unwrap(), &expected);
        assert_eq!(fx.store.fetch(&first).await.unwrap(), expected);
        assert_eq!(fx.store.revisions(&first).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_loads_from_store() {
        let fx = Fixture::new();
        let handle = fx.cache().set(content(&[("user", "alice")])).await.unwrap();

        let mut cache = fx.cache();
        assert_eq!(cache.get().await.unwrap(), &content(&[("user", "alice")]));
        assert_eq!(cache.handle().await.unwrap(), Some(handle.clone()));

        // a later set reuses the existing secret
        let again = cache.set(content(&[("pass", "s3cr3t")])).await.unwrap();
        assert_eq!(again, handle);
        assert_eq!(fx.store.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_handle_is_treated_as_no_secret() {
        let fx = Fixture::new();
        fx.peers.set(SECRET_ID_KEY, "secret:gone").await.unwrap();

        let mut cache = fx.cache();
        assert!(cache.get().await.unwrap().is_empty());
        assert_eq!(cache.handle().await.unwrap(), None);

        let handle = cache.set(content(&[("user", "alice")])).await.unwrap();
        assert_ne!(handle.as_str(), "secret:gone");
        assert_eq!(fx.peer_handle().as_deref(), Some(handle.as_str()));
    }

    #[tokio::test]
    async fn test_delete_last_key_removes_secret() {
        let fx = Fixture::new();
        let mut cache = fx.cache();
        let handle = cache.set(content(&[("user", "alice")])).await.unwrap();

        cache.delete("user").await.unwrap();

        assert!(cache.get().await.unwrap().is_empty());
        assert_eq!(fx.peer_handle(), None);
        assert!(!fx.store.contains(&handle));
        assert_eq!(cache.handle().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_keeps_remaining_keys() {
        let fx = Fixture::new();
        let mut cache = fx.cache();
        let handle = cache
            .set(content(&[("user", "alice"), ("pass", "s3cr3t")]))
            .await
            .unwrap();

        cache.delete("user").await.unwrap();

        assert_eq!(cache.get().await.unwrap(), &content(&[("pass", "s3cr3t")]));
        assert_eq!(fx.store.fetch(&handle).await.unwrap(), content(&[("pass", "s3cr3t")]));
        assert_eq!(fx.peer_handle().as_deref(), Some(handle.as_str()));
    }

    #[tokio::test]
    async fn test_delete_without_content_is_noop() {
        let fx = Fixture::new();
        let mut cache = fx.cache();

        cache.delete("user").await.unwrap();
        cache.delete("user").await.unwrap();

        assert!(fx.store.is_empty());
        assert_eq!(fx.peer_handle(), None);
    }

    #[tokio::test]
    async fn test_delete_unknown_key_rewrites_content() {
        let fx = Fixture::new();
        let mut cache = fx.cache();
        let handle = cache.set(content(&[("user", "alice")])).await.unwrap();

        cache.delete("pass").await.unwrap();

        assert_eq!(cache.get().await.unwrap(), &content(&[("user", "alice")]));
        assert_eq!(fx.store.revisions(&handle).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_forget_all_leaves_revisions() {
        let fx = Fixture::new();
        let mut cache = fx.cache();
        let handle = cache.set(content(&[("user", "alice")])).await.unwrap();

        cache.forget_all().await.unwrap();

        assert_eq!(fx.peer_handle(), None);
        assert!(cache.get().await.unwrap().is_empty());
        assert!(fx.store.contains(&handle));
        assert!(fx.cache().get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_set_merge_delete() {
        let fx = Fixture::new();
        let mut cache = fx.cache();

        let h1 = cache.set(content(&[("user", "alice")])).await.unwrap();
        assert_eq!(cache.get().await.unwrap(), &content(&[("user", "alice")]));

        let h2 = cache.set(content(&[("pass", "s3cr3t")])).await.unwrap();
        assert_eq!(h1, h2);
        assert_eq!(
            cache.get().await.unwrap(),
            &content(&[("user", "alice"), ("pass", "s3cr3t")])
        );

        cache.delete("user").await.unwrap();
        assert_eq!(cache.get().await.unwrap(), &content(&[("pass", "s3cr3t")]));

        cache.delete("pass").await.unwrap();
        assert!(cache.get().await.unwrap().is_empty());
        assert_eq!(fx.peer_handle(), None);
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    #[async_trait]
    impl SecretStore for ReadOnlyStore {
        async fn create(&self, _content: &SecretContent) -> Result<SecretHandle, StoreError> {
            Err(StoreError::HookTool {
                tool: "secret-add".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "ERROR permission denied".to_string(),
            })
        }

        async fn fetch(&self, handle: &SecretHandle) -> Result<SecretContent, StoreError> {
            Err(StoreError::NotFound(handle.clone()))
        }

        async fn update(
            &self,
            handle: &SecretHandle,
            _content: &SecretContent,
        ) -> Result<(), StoreError> {
            Err(StoreError::NotFound(handle.clone()))
        }

        async fn remove_all_revisions(&self, handle: &SecretHandle) -> Result<(), StoreError> {
            Err(StoreError::NotFound(handle.clone()))
        }
    }

    #[tokio::test]
    async fn test_store_faults_propagate() {
        let peers = Arc::new(EphemeralPeerData::new());
        let mut cache = SecretCache::new(Arc::new(ReadOnlyStore), peers.clone());

        let result = cache.set(content(&[("user", "alice")])).await;

        assert!(matches!(result, Err(StoreError::HookTool { .. })));
        assert!(peers.snapshot().is_empty());
        assert!(cache.get().await.unwrap().is_empty());
    }
}
