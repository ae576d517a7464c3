//! Session domain module.
//!
//! This module contains the chat session model, the persistence interface,
//! and the in-memory store that owns the session list.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `Message`)
//! - `model`: Core session model (`ChatSession`) and title derivation
//! - `repository`: Storage interface (`StateRepository`, `PersistedState`)
//! - `store`: Session list ownership and CRUD (`SessionStore`)

mod message;
mod model;
mod repository;
mod store;

#[cfg(test)]
mod store_test;

// Re-export public API
pub use message::{Message, MessageRole};
pub use model::{
    ChatSession, DEFAULT_SESSION_TITLE, SHARED_SESSION_TITLE, TITLE_MAX_CHARS, WELCOME_MESSAGE,
    derive_title,
};
pub use repository::{InMemoryStateRepository, PersistedState, StateRepository};
pub use store::{EMPTY_REPLY_FALLBACK, ERROR_REPLY, SessionStore};

/// Current wall-clock time as epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
