//! Session state repository trait.
//!
//! Defines the interface the [`SessionStore`](super::SessionStore) persists
//! through, decoupling it from the concrete storage mechanism.

use super::model::ChatSession;
use crate::error::{AuraError, Result};
use std::sync::Mutex;

/// Everything that survives a restart: the session list and the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Sessions, most recent first
    pub sessions: Vec<ChatSession>,
    /// ID of the active session, if any
    pub current_session_id: Option<String>,
}

/// An abstract repository for the application state.
///
/// Saves are whole-state writes; implementations must never expose a
/// partially written state to a later `load`.
pub trait StateRepository: Send + Sync {
    /// Loads the persisted state.
    ///
    /// # Returns
    ///
    /// - `Ok(PersistedState)`: State loaded (empty if nothing was stored yet)
    /// - `Err(_)`: Storage could not be read or parsed
    fn load(&self) -> Result<PersistedState>;

    /// Replaces the persisted state.
    fn save(&self, state: &PersistedState) -> Result<()>;
}

/// Repository that keeps the state in memory only.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    state: Mutex<PersistedState>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `state`.
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateRepository for InMemoryStateRepository {
    fn load(&self) -> Result<PersistedState> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|e| AuraError::storage(format!("state lock poisoned: {e}")))
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| AuraError::storage(format!("state lock poisoned: {e}")))?;
        *guard = state.clone();
        Ok(())
    }
}
