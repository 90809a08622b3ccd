//! Event dispatch table

use futures::future::BoxFuture;
use secrets_test_backend::{PeerData, SecretStore};
use secrets_test_core::{ActionParams, ActionResults, CharmError, ErrorCode, TOMBSTONE};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::actions;
use crate::cache::SecretCache;
use crate::event::Event;

/// Per-event charm state handed to every handler
#[derive(Debug)]
pub struct Charm {
    pub cache: SecretCache,
    pub(crate) tombstone: String,
}

impl Charm {
    pub fn new(store: Arc<dyn SecretStore>, peers: Arc<dyn PeerData>) -> Self {
        Self {
            cache: SecretCache::new(store, peers),
            tombstone: TOMBSTONE.to_string(),
        }
    }

    /// Replace the value `pseudo-delete-secrets` writes
    pub fn with_tombstone(mut self, tombstone: impl Into<String>) -> Self {
        self.tombstone = tombstone.into();
        self
    }
}

/// Status the unit should report after a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: &'static str,
    pub message: String,
}

impl StatusUpdate {
    pub fn active() -> Self {
        Self {
            status: "active",
            message: String::new(),
        }
    }
}

pub type ActionHandler =
    for<'a> fn(&'a mut Charm, ActionParams) -> BoxFuture<'a, Result<ActionResults, CharmError>>;

pub type HookHandler = fn() -> Option<StatusUpdate>;

/// Maps hook and action names to their handlers
pub struct Dispatcher {
    actions: HashMap<&'static str, ActionHandler>,
    hooks: HashMap<&'static str, HookHandler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut action_table: HashMap<&'static str, ActionHandler> = HashMap::new();
        action_table.insert("set-secret", actions::set_secret);
        action_table.insert("get-secrets", actions::get_secrets);
        action_table.insert("delete-secrets", actions::delete_secrets);
        action_table.insert("pseudo-delete-secrets", actions::pseudo_delete_secrets);
        action_table.insert("forget-all-secrets", actions::forget_all_secrets);

        let mut hooks: HashMap<&'static str, HookHandler> = HashMap::new();
        hooks.insert("start", on_start);

        Self {
            actions: action_table,
            hooks,
        }
    }

    /// Registered action names, sorted
    pub fn action_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.actions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn handles_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub async fn run_action(
        &self,
        charm: &mut Charm,
        name: &str,
        params: ActionParams,
    ) -> Result<ActionResults, CharmError> {
        let handler = self.actions.get(name).ok_or_else(|| {
            CharmError::new(ErrorCode::UnknownAction, format!("no handler for action {name:?}"))
                .with_action(name)
        })?;

        info!(action = %name, params = params.len(), "Running action");
        handler(charm, params).await.map_err(|e| e.with_action(name))
    }

    /// Run a hook; hooks without a handler are ignored
    pub fn run_hook(&self, name: &str) -> Option<StatusUpdate> {
        match self.hooks.get(name) {
            Some(handler) => {
                info!(hook = %name, "Running hook");
                handler()
            }
            None => {
                debug!(hook = %name, "No handler for hook, ignoring");
                None
            }
        }
    }

    /// Route an event; hooks never produce results
    pub async fn dispatch(
        &self,
        charm: &mut Charm,
        event: &Event,
        params: ActionParams,
    ) -> Result<Dispatched, CharmError> {
        match event {
            Event::Action(name) => self
                .run_action(charm, name, params)
                .await
                .map(Dispatched::Results),
            Event::Hook(name) => Ok(Dispatched::Status(self.run_hook(name))),
        }
    }
}

/// What a dispatched event asks the host to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Results(ActionResults),
    Status(Option<StatusUpdate>),
}

fn on_start() -> Option<StatusUpdate> {
    Some(StatusUpdate::active())
}
