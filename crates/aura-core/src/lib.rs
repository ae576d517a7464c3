//! Core domain of the Aura chat client.
//!
//! Holds the session model and store, the share and transcript codecs, the
//! attachment codec, and the model gateway boundary. Storage and network
//! implementations live in the infrastructure and interaction crates.

pub mod attachment;
pub mod config;
pub mod error;
pub mod gateway;
pub mod knowledge;
pub mod session;
pub mod share;
pub mod transcript;

// Re-export common error type
pub use error::AuraError;
