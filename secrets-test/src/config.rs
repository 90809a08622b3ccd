//! Configuration management

use clap::ValueEnum;
use secrets_test_core::{PEER_RELATION, TOMBSTONE};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Log levels the charm accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Matching `tracing` filter directive
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct CharmConfig {
    #[serde(default = "default_peer_relation")]
    pub peer_relation: String,

    #[serde(default = "default_tombstone")]
    pub tombstone: String,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Where the hook tools live; PATH lookup when unset
    #[serde(default)]
    pub hook_tools_dir: Option<PathBuf>,
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            peer_relation: default_peer_relation(),
            tombstone: default_tombstone(),
            log_level: LogLevel::default(),
            hook_tools_dir: None,
        }
    }
}

fn default_peer_relation() -> String {
    PEER_RELATION.to_string()
}

fn default_tombstone() -> String {
    TOMBSTONE.to_string()
}

impl CharmConfig {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path, `secrets-test.{toml,yaml,json}` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("secrets-test").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("SECRETS_TEST"))
            .build()?;

        Ok(config.try_deserialize::<CharmConfig>()?)
    }
}
