//! Backends for the secrets-test charm
//!
//! Two families of backends sit behind the [`SecretStore`] and [`PeerData`]
//! traits:
//! - hook-tool backends, which shell out to the tools the host puts on PATH
//!   while an event runs (`secret-add`, `relation-set`, ...)
//! - ephemeral (in-memory) backends, used by tests and the harness

mod ephemeral;
mod hook_tools;
mod traits;


pub use ephemeral::{EphemeralPeerData, EphemeralSecretStore, SecretRevision};
pub use hook_tools::{HookToolPeerData, HookToolSecretStore, HookTools};
pub use traits::{PeerData, SecretStore, StoreError};
