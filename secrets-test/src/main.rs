//! secrets-test - charm that exercises the host's secret backend
//!
//! Installed as the charm's `dispatch` executable. Each invocation handles one
//! hook or action, named by `JUJU_DISPATCH_PATH`.

mod config;
mod runner;

use clap::Parser;
use secrets_test_charm::Event;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CharmConfig, LogLevel};
use crate::runner::{app_name, Runner};

#[derive(Parser, Debug)]
#[command(name = "secrets-test")]
#[command(about = "Charm exercising a secret shared across peer units", long_about = None)]
struct Args {
    /// Event to handle, `hooks/<name>` or `actions/<name>`
    #[arg(env = "JUJU_DISPATCH_PATH")]
    event: String,

    /// Name of the unit running the event
    #[arg(long, env = "JUJU_UNIT_NAME")]
    unit_name: String,

    /// Configuration file
    #[arg(long, env = "SECRETS_TEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Directory holding the hook tools (default: PATH lookup)
    #[arg(long)]
    hook_tools_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = CharmConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.hook_tools_dir.is_some() {
        config.hook_tools_dir = args.hook_tools_dir;
    }

    // Initialize tracing; stderr ends up in the unit's log
    let level = config.log_level.as_directive();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "secrets_test={level},secrets_test_charm={level},secrets_test_backend={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let event: Event = args.event.parse()?;
    let app = app_name(&args.unit_name)?;

    info!(unit = %args.unit_name, event = %event, "Starting secrets-test");

    let runner = Runner::new(&config, app);
    runner.run(&event).await
}
