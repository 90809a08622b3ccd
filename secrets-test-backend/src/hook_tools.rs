//! Hook-tool backed implementations
//!
//! While a hook or action runs, the host puts a set of tools on PATH
//! (`secret-add`, `relation-get`, `action-set`, ...). Everything the charm
//! persists goes through them.

use async_trait::async_trait;
use secrets_test_core::{validate_content, SecretContent, SecretHandle};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::traits::{PeerData, SecretStore, StoreError};

/// Runner for host hook tools
#[derive(Debug, Clone, Default)]
pub struct HookTools {
    /// Directory holding the tools; `None` resolves them through PATH
    dir: Option<PathBuf>,
}

impl HookTools {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn program(&self, tool: &str) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Run a tool to completion and return its trimmed stdout
    pub async fn run<I, S>(&self, tool: &str, args: I) -> Result<String, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        debug!(tool = %tool, "Running hook tool");

        let output = Command::new(self.program(tool))
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StoreError::HookTool {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a tool invoked with `--format=json` and decode its output
    pub async fn run_json<T, I, S>(&self, tool: &str, args: I) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.run(tool, args).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    // === Action and status tools ===

    /// Parameters of the running action
    pub async fn action_get(&self) -> Result<serde_json::Value, StoreError> {
        let stdout = self.run("action-get", ["--format=json"]).await?;
        if stdout.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    /// Report `key=value` results; a no-op when there is nothing to report
    pub async fn action_set(&self, args: &[String]) -> Result<(), StoreError> {
        if args.is_empty() {
            return Ok(());
        }
        self.run("action-set", args).await.map(drop)
    }

    pub async fn action_fail(&self, message: &str) -> Result<(), StoreError> {
        self.run("action-fail", [message]).await.map(drop)
    }

    pub async fn status_set(&self, status: &str, message: &str) -> Result<(), StoreError> {
        self.run("status-set", [status, message]).await.map(drop)
    }
}

fn content_args(content: &SecretContent) -> impl Iterator<Item = String> + '_ {
    content.iter().map(|(k, v)| format!("{k}={v}"))
}

/// Secret store backed by `secret-add`, `secret-get`, `secret-set` and
/// `secret-remove`
#[derive(Debug, Clone)]
pub struct HookToolSecretStore {
    tools: HookTools,
}

impl HookToolSecretStore {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl SecretStore for HookToolSecretStore {
    async fn create(&self, content: &SecretContent) -> Result<SecretHandle, StoreError> {
        validate_content(content)?;

        let args: Vec<String> = ["--owner".to_string(), "application".to_string()]
            .into_iter()
            .chain(content_args(content))
            .collect();
        let id = self.tools.run("secret-add", &args).await?;
        Ok(SecretHandle::new(id))
    }

    async fn fetch(&self, handle: &SecretHandle) -> Result<SecretContent, StoreError> {
        let result: Result<SecretContent, StoreError> = self
            .tools
            .run_json("secret-get", [handle.as_str(), "--refresh", "--format=json"])
            .await;

        match result {
            Err(StoreError::HookTool { stderr, .. }) if stderr.contains("not found") => {
                Err(StoreError::NotFound(handle.clone()))
            }
            other => other,
        }
    }

    async fn update(
        &self,
        handle: &SecretHandle,
        content: &SecretContent,
    ) -> Result<(), StoreError> {
        validate_content(content)?;

        let args: Vec<String> = std::iter::once(handle.to_string())
            .chain(content_args(content))
            .collect();
        self.tools.run("secret-set", &args).await.map(drop)
    }

    async fn remove_all_revisions(&self, handle: &SecretHandle) -> Result<(), StoreError> {
        self.tools
            .run("secret-remove", [handle.as_str()])
            .await
            .map(drop)
    }
}

/// Application databag of the peer relation, via `relation-get`/`relation-set`
#[derive(Debug)]
pub struct HookToolPeerData {
    tools: HookTools,
    endpoint: String,
    app_name: String,
    relation_id: OnceCell<Option<String>>,
}

impl HookToolPeerData {
    pub fn new(tools: HookTools, endpoint: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            tools,
            endpoint: endpoint.into(),
            app_name: app_name.into(),
            relation_id: OnceCell::new(),
        }
    }

    /// Id of the peer relation, `None` until the relation is established
    async fn relation_id(&self) -> Result<Option<&str>, StoreError> {
        let id = self
            .relation_id
            .get_or_try_init(|| async {
                let ids: Option<Vec<String>> = self
                    .tools
                    .run_json("relation-ids", [self.endpoint.as_str(), "--format=json"])
                    .await?;
                Ok::<_, StoreError>(ids.and_then(|ids| ids.into_iter().next()))
            })
            .await?;
        Ok(id.as_deref())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let Some(relation_id) = self.relation_id().await? else {
            warn!(endpoint = %self.endpoint, key = %key, "No peer relation, dropping peer data write");
            return Ok(());
        };
        let assignment = format!("{key}={value}");
        self.tools
            .run("relation-set", ["-r", relation_id, "--app", assignment.as_str()])
            .await
            .map(drop)
    }
}

#[async_trait]
impl PeerData for HookToolPeerData {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let Some(relation_id) = self.relation_id().await? else {
            return Ok(None);
        };
        let data: Option<HashMap<String, String>> = self
            .tools
            .run_json(
                "relation-get",
                [
                    "-r",
                    relation_id,
                    "--app",
                    "--format=json",
                    "-",
                    self.app_name.as_str(),
                ],
            )
            .await?;
        Ok(data.and_then(|mut d| d.remove(key)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value).await
    }

    /// Setting an empty value removes the key from the databag
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.write(key, "").await
    }
}
