//! Test harness for the secrets-test charm
//!
//! Provides an in-process stand-in for a deployed application:
//! - units share one in-memory secret store and one peer databag
//! - every action runs with a fresh charm, the way each event gets a fresh
//!   process on a real unit
//! - results come back flattened, exactly as `action-set` would record them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use secrets_test_harness::{keys, TestModel};
//!
//! #[tokio::test]
//! async fn test_delete() {
//!     let model = TestModel::new();
//!     let unit = model.unit(0);
//!
//!     unit.run_action("set-secret", secrets_test_harness::numbered_content(3)).await;
//!     unit.run_action("delete-secrets", keys(&["key0"])).await;
//!
//!     let secrets = unit.run_action("get-secrets", Default::default()).await;
//!     assert_eq!(secrets.nested("secrets").len(), 2);
//! }
//! ```

pub mod model;
pub mod params;

pub use model::{ActionOutcome, ActionStatus, TestModel, TestUnit};
pub use params::{content, keys, numbered_content, numbered_keys};

/// Application name used when none is given
pub const DEFAULT_APP: &str = "secrets-test";

/// Install a test-friendly tracing subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secrets_test=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
