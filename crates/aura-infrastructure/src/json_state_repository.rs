//! JSON file-backed state repository.
//!
//! Layout in the data directory:
//!
//! ```text
//! sessions.json           # JSON array of ChatSession, most recent first
//! last-active-session     # plain-text ID of the current session
//! ```

use crate::paths::AuraPaths;
use crate::storage::{AtomicFile, AtomicFileError, FileLock, read_text, remove_file, write_text};
use aura_core::error::{AuraError, Result};
use aura_core::session::{ChatSession, PersistedState, StateRepository};
use std::path::PathBuf;

/// A repository that persists sessions as a JSON array next to a pointer file.
pub struct JsonStateRepository {
    sessions: AtomicFile<Vec<ChatSession>>,
    active_session_path: PathBuf,
}

impl JsonStateRepository {
    pub fn new(paths: &AuraPaths) -> Self {
        Self::with_files(paths.sessions_file(), paths.active_session_file())
    }

    pub fn with_files(sessions_path: PathBuf, active_session_path: PathBuf) -> Self {
        Self {
            sessions: AtomicFile::json(sessions_path),
            active_session_path,
        }
    }
}

impl StateRepository for JsonStateRepository {
    fn load(&self) -> Result<PersistedState> {
        let sessions = self.sessions.load().map_err(to_aura_error)?.unwrap_or_default();
        let current_session_id = read_text(&self.active_session_path)
            .map_err(to_aura_error)?
            .map(|id| id.trim().to_string());

        tracing::debug!(
            "[JsonStateRepository] Loaded {} sessions from {}",
            sessions.len(),
            self.sessions.path().display()
        );

        Ok(PersistedState {
            sessions,
            current_session_id,
        })
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let _lock = FileLock::acquire(self.sessions.path()).map_err(to_aura_error)?;

        self.sessions.save(&state.sessions).map_err(to_aura_error)?;
        match &state.current_session_id {
            Some(id) => write_text(&self.active_session_path, id),
            None => remove_file(&self.active_session_path),
        }
        .map_err(to_aura_error)
    }
}

fn to_aura_error(error: AtomicFileError) -> AuraError {
    match error {
        AtomicFileError::JsonError(e) => AuraError::Serialization {
            format: "JSON".to_string(),
            message: e.to_string(),
        },
        other => AuraError::storage(other.to_string()),
    }
}
