//! In-process application model

use secrets_test_backend::{EphemeralPeerData, EphemeralSecretStore, SecretRevision};
use secrets_test_charm::{Charm, Dispatcher, StatusUpdate};
use secrets_test_core::{ActionParams, SecretHandle, SECRET_ID_KEY};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use crate::DEFAULT_APP;

/// Final state of an action run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Completed,
    Failed,
}

/// What the host would record for one action
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub status: ActionStatus,
    /// Flattened `action-set` results
    pub results: BTreeMap<String, String>,
    /// `action-fail` message
    pub message: Option<String>,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == ActionStatus::Completed
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.results.get(key).map(String::as_str)
    }

    /// Entries under `prefix.`, with the prefix stripped
    pub fn nested(&self, prefix: &str) -> BTreeMap<String, String> {
        let dotted = format!("{prefix}.");
        self.results
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&dotted).map(|rest| (rest.to_string(), v.clone())))
            .collect()
    }
}

/// A deployed application whose units share a secret store and peer data
pub struct TestModel {
    app: String,
    store: Arc<EphemeralSecretStore>,
    peers: Arc<EphemeralPeerData>,
    dispatcher: Dispatcher,
}

impl Default for TestModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TestModel {
    pub fn new() -> Self {
        Self::with_peers(DEFAULT_APP, EphemeralPeerData::new())
    }

    /// An application whose peer relation has not been established
    pub fn without_peer_relation() -> Self {
        Self::with_peers(DEFAULT_APP, EphemeralPeerData::detached())
    }

    fn with_peers(app: &str, peers: EphemeralPeerData) -> Self {
        Self {
            app: app.to_string(),
            store: Arc::new(EphemeralSecretStore::new()),
            peers: Arc::new(peers),
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn unit(&self, number: u32) -> TestUnit<'_> {
        TestUnit {
            model: self,
            name: format!("{}/{number}", self.app),
        }
    }

    pub fn store(&self) -> &EphemeralSecretStore {
        &self.store
    }

    pub fn peer_data(&self) -> HashMap<String, String> {
        self.peers.snapshot()
    }

    /// Handle currently recorded in peer data
    pub fn secret_id(&self) -> Option<SecretHandle> {
        self.peer_data().remove(SECRET_ID_KEY).map(SecretHandle::from)
    }

    pub fn revisions(&self, handle: &SecretHandle) -> Option<Vec<SecretRevision>> {
        self.store.revisions(handle)
    }

    fn charm(&self) -> Charm {
        Charm::new(self.store.clone(), self.peers.clone())
    }
}

/// One unit of a [`TestModel`]
pub struct TestUnit<'a> {
    model: &'a TestModel,
    name: String,
}

impl TestUnit<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run an action the way the host would: fresh charm, flattened results
    pub async fn run_action(&self, action: &str, params: ActionParams) -> ActionOutcome {
        let span = info_span!("action", unit = %self.name, action = %action);
        let mut charm = self.model.charm();

        let outcome = self
            .model
            .dispatcher
            .run_action(&mut charm, action, params)
            .instrument(span)
            .await;

        match outcome {
            Ok(results) => ActionOutcome {
                status: ActionStatus::Completed,
                results: results.flatten(),
                message: None,
            },
            Err(err) => {
                info!(unit = %self.name, error = %err, "Action failed");
                ActionOutcome {
                    status: ActionStatus::Failed,
                    results: BTreeMap::new(),
                    message: Some(err.to_failure_message()),
                }
            }
        }
    }

    pub fn run_hook(&self, hook: &str) -> Option<StatusUpdate> {
        let _guard = info_span!("hook", unit = %self.name, hook = %hook).entered();
        self.model.dispatcher.run_hook(hook)
    }
}
