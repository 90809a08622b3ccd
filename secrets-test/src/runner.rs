//! Event runner: wires the charm to the host's hook tools

use secrets_test_backend::{HookToolPeerData, HookToolSecretStore, HookTools, PeerData, SecretStore};
use secrets_test_charm::{Charm, Dispatched, Dispatcher, Event};
use secrets_test_core::{ActionParams, CharmError};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::CharmConfig;

/// Application name of a unit, e.g. `secrets-test` for `secrets-test/0`
pub fn app_name(unit_name: &str) -> Result<&str, CharmError> {
    match unit_name.split_once('/') {
        Some((app, number)) if !app.is_empty() && number.parse::<u32>().is_ok() => Ok(app),
        _ => Err(CharmError::invalid_parameter(format!(
            "malformed unit name {unit_name:?}"
        ))),
    }
}

/// Everything needed to handle one event
pub struct Runner {
    tools: HookTools,
    store: Arc<dyn SecretStore>,
    peers: Arc<dyn PeerData>,
    dispatcher: Dispatcher,
    tombstone: String,
}

impl Runner {
    pub fn new(config: &CharmConfig, app_name: &str) -> Self {
        let tools = HookTools::new(config.hook_tools_dir.clone());
        let store: Arc<dyn SecretStore> = Arc::new(HookToolSecretStore::new(tools.clone()));
        let peers: Arc<dyn PeerData> = Arc::new(HookToolPeerData::new(
            tools.clone(),
            config.peer_relation.clone(),
            app_name,
        ));

        Self {
            tools,
            store,
            peers,
            dispatcher: Dispatcher::new(),
            tombstone: config.tombstone.clone(),
        }
    }

    /// Handle `event` and report its outcome to the host
    ///
    /// Action failures are reported through `action-fail` and do not fail the
    /// process; hook failures do.
    pub async fn run(&self, event: &Event) -> anyhow::Result<()> {
        info!(event = %event, "Dispatching event");

        match self.handle(event).await {
            Ok(()) => Ok(()),
            Err(err) if event.is_action() => {
                if err.code.is_client_error() {
                    warn!(event = %event, error = %err, "Action rejected");
                } else {
                    error!(event = %event, error = %err, "Action failed");
                }
                self.tools.action_fail(&err.to_failure_message()).await?;
                Ok(())
            }
            Err(err) => {
                error!(event = %event, error = %err, "Hook failed");
                Err(err.into())
            }
        }
    }

    async fn handle(&self, event: &Event) -> Result<(), CharmError> {
        let mut charm = Charm::new(self.store.clone(), self.peers.clone())
            .with_tombstone(self.tombstone.clone());

        let params = if event.is_action() {
            ActionParams::from_value(self.tools.action_get().await?)?
        } else {
            ActionParams::new()
        };

        match self.dispatcher.dispatch(&mut charm, event, params).await? {
            Dispatched::Results(results) => {
                self.tools.action_set(&results.to_args()).await?;
            }
            Dispatched::Status(Some(status)) => {
                self.tools.status_set(status.status, &status.message).await?;
            }
            Dispatched::Status(None) => {}
        }
        Ok(())
    }
}
