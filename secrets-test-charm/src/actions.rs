//! Action handlers

use futures::future::BoxFuture;
use secrets_test_core::{ActionParams, ActionResults, CharmError, SecretContent};
use tracing::info;

use crate::dispatch::Charm;

type ActionFuture<'a> = BoxFuture<'a, Result<ActionResults, CharmError>>;

/// `set-secret`: merge every parameter into the shared secret
pub(crate) fn set_secret(charm: &mut Charm, params: ActionParams) -> ActionFuture<'_> {
    Box::pin(async move {
        let content = params.into_content()?;
        let handle = charm.cache.set(content).await?;
        Ok(ActionResults::new().with_value("secret-id", handle.into_inner()))
    })
}

/// `get-secrets`: return the secret's content
pub(crate) fn get_secrets(charm: &mut Charm, _params: ActionParams) -> ActionFuture<'_> {
    Box::pin(async move {
        let content = charm.cache.get().await?;
        Ok(ActionResults::new().with_content("secrets", content))
    })
}

/// `delete-secrets`: remove each of `keys`, one at a time
pub(crate) fn delete_secrets(charm: &mut Charm, params: ActionParams) -> ActionFuture<'_> {
    Box::pin(async move {
        let keys = params.string_list("keys")?;
        for key in &keys {
            charm.cache.delete(key).await?;
        }
        Ok(ActionResults::new())
    })
}

/// `pseudo-delete-secrets`: overwrite each of `keys` with the tombstone
pub(crate) fn pseudo_delete_secrets(charm: &mut Charm, params: ActionParams) -> ActionFuture<'_> {
    Box::pin(async move {
        let keys = params.string_list("keys")?;
        for key in keys {
            let tombstone = SecretContent::from([(key, charm.tombstone.clone())]);
            charm.cache.set(tombstone).await?;
        }
        Ok(ActionResults::new())
    })
}

/// `forget-all-secrets`: drop the peer reference, keep the revisions
pub(crate) fn forget_all_secrets(charm: &mut Charm, _params: ActionParams) -> ActionFuture<'_> {
    Box::pin(async move {
        if let Some(handle) = charm.cache.stored_handle().await? {
            charm.cache.forget_all().await?;
            info!(secret_id = %handle, "Secret reference removed from peer data");
        }
        Ok(ActionResults::new())
    })
}
