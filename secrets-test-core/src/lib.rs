//! Core types for the secrets-test charm
//!
//! This crate provides the types shared by the backends, the charm logic and
//! the dispatch binary.

pub mod content;
pub mod error;
pub mod params;
pub mod results;

pub use content::{
    validate_content, ContentError, SecretContent, SecretHandle, PEER_RELATION, SECRET_ID_KEY,
    TOMBSTONE,
};
pub use error::{CharmError, ErrorCode};
pub use params::ActionParams;
pub use results::ActionResults;
