//! The secrets-test charm
//!
//! A single application-owned secret is shared by all units through the
//! `secret-id` entry of the peer relation. Actions read and mutate it through
//! [`SecretCache`]; [`Dispatcher`] routes hooks and actions to their handlers.

mod actions;
pub mod cache;
pub mod dispatch;
pub mod event;

pub use cache::SecretCache;
pub use dispatch::{ActionHandler, Charm, Dispatched, Dispatcher, HookHandler, StatusUpdate};
pub use event::Event;
