//! Application layer for aura.
//!
//! This crate provides the use cases that coordinate the session store,
//! the model gateway and the filesystem: sending messages, composing drafts,
//! sharing and startup.

pub mod bootstrap;
pub mod chat_service;
pub mod draft;

pub use chat_service::{ChatService, ImportError, ImportedShare, PendingReply, SendOutcome};
pub use draft::Draft;
