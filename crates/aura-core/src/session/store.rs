use super::message::{Message, MessageRole};
use super::model::{ChatSession, derive_title};
use super::repository::{PersistedState, StateRepository};
use crate::attachment::Attachment;
use crate::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Assistant content used when the model produced no text.
pub const EMPTY_REPLY_FALLBACK: &str = "Analysis complete. No output generated.";

/// Assistant content appended when a generation request failed.
pub const ERROR_REPLY: &str = "System error: Neural link failed. Please retry your request.";

/// Owns the session list and the active-session pointer.
///
/// `SessionStore` is responsible for:
/// - Creating, selecting, deleting and importing sessions
/// - Appending messages and deriving titles
/// - Tracking which sessions have a generation request in flight
/// - Persisting `{sessions, current_session_id}` after every mutation
///
/// Sessions are kept most-recent-first: new and imported sessions are
/// prepended. When the list is non-empty the current id always resolves.
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current_session_id: Option<String>,
    /// Sessions with an outstanding generation request (not persisted)
    in_flight: HashSet<String>,
    repository: Arc<dyn StateRepository>,
}

impl SessionStore {
    /// Creates an empty store backed by `repository`. Nothing is loaded.
    pub fn new(repository: Arc<dyn StateRepository>) -> Self {
        Self {
            sessions: Vec::new(),
            current_session_id: None,
            in_flight: HashSet::new(),
            repository,
        }
    }

    /// Loads the persisted state from `repository`.
    ///
    /// A current id that no longer resolves is repointed at the first session
    /// (or cleared when there are none). The repair is not written back until
    /// the next mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    pub fn load(repository: Arc<dyn StateRepository>) -> Result<Self> {
        let PersistedState {
            sessions,
            current_session_id,
        } = repository.load()?;

        let mut store = Self {
            sessions,
            current_session_id,
            in_flight: HashSet::new(),
            repository,
        };

        let resolves = store
            .current_session_id
            .as_deref()
            .is_some_and(|id| store.position(id).is_some());
        if !resolves {
            let repaired = store.sessions.first().map(|s| s.id.clone());
            if store.current_session_id.is_some() || repaired.is_some() {
                tracing::warn!(
                    "[SessionStore] Current session {:?} does not resolve, selecting {:?}",
                    store.current_session_id,
                    repaired
                );
            }
            store.current_session_id = repaired;
        }

        tracing::debug!(
            "[SessionStore] Loaded {} sessions (current: {:?})",
            store.sessions.len(),
            store.current_session_id
        );
        Ok(store)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// All sessions, most recent first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Whether a generation request is outstanding for `session_id`.
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.in_flight.contains(session_id)
    }

    /// Copy of the state as it is persisted.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            sessions: self.sessions.clone(),
            current_session_id: self.current_session_id.clone(),
        }
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Creates a session seeded with the welcome message and makes it current.
    pub fn create_session(&mut self) -> Result<ChatSession> {
        let session = ChatSession::new();
        tracing::info!("[SessionStore] Created session {}", session.id);

        self.sessions.insert(0, session.clone());
        self.current_session_id = Some(session.id.clone());
        self.persist()?;
        Ok(session)
    }

    /// Makes `id` the current session.
    ///
    /// Returns `Ok(false)` without touching anything if `id` is unknown.
    pub fn select_session(&mut self, id: &str) -> Result<bool> {
        if self.position(id).is_none() {
            tracing::debug!("[SessionStore] Ignoring selection of unknown session {}", id);
            return Ok(false);
        }

        self.current_session_id = Some(id.to_string());
        self.persist()?;
        Ok(true)
    }

    /// Removes a session.
    ///
    /// If it was current, the first remaining session becomes current, or the
    /// current id is cleared when none remain. Returns `Ok(false)` if `id` is
    /// unknown.
    pub fn delete_session(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        self.sessions.remove(index);
        self.in_flight.remove(id);
        if self.current_session_id.as_deref() == Some(id) {
            self.current_session_id = self.sessions.first().map(|s| s.id.clone());
        }

        tracing::info!(
            "[SessionStore] Deleted session {} (current: {:?})",
            id,
            self.current_session_id
        );
        self.persist()?;
        Ok(true)
    }

    /// Drops every session, then creates a fresh one.
    pub fn clear_all(&mut self) -> Result<ChatSession> {
        tracing::info!("[SessionStore] Clearing {} sessions", self.sessions.len());
        self.sessions.clear();
        self.current_session_id = None;
        self.in_flight.clear();
        self.create_session()
    }

    /// Adds a session holding `messages` verbatim, titled "Shared Session",
    /// and makes it current.
    ///
    /// An empty list is seeded with the welcome message so the session is
    /// never empty.
    pub fn import_session(&mut self, messages: Vec<Message>) -> Result<ChatSession> {
        let messages = if messages.is_empty() {
            ChatSession::new().messages
        } else {
            messages
        };
        let session = ChatSession::imported(messages);
        tracing::info!(
            "[SessionStore] Imported shared session {} ({} messages)",
            session.id,
            session.messages.len()
        );

        self.sessions.insert(0, session.clone());
        self.current_session_id = Some(session.id.clone());
        self.persist()?;
        Ok(session)
    }

    // ============================================================================
    // Messages
    // ============================================================================

    /// Appends a user message to the current session and marks it busy.
    ///
    /// Returns `Ok(None)` without any state change when:
    /// - `content` is blank and `attachments` is empty
    /// - a request is already in flight for `session_id`
    /// - `session_id` is not the current session
    ///
    /// The first user message of a session still carrying the placeholder
    /// title renames it (see [`derive_title`]).
    pub fn append_user_message(
        &mut self,
        session_id: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Option<Message>> {
        if content.trim().is_empty() && attachments.is_empty() {
            return Ok(None);
        }
        if self.is_busy(session_id) {
            tracing::debug!("[SessionStore] Session {} is busy, send ignored", session_id);
            return Ok(None);
        }
        if self.current_session_id.as_deref() != Some(session_id) {
            return Ok(None);
        }
        let Some(index) = self.position(session_id) else {
            return Ok(None);
        };

        let message = Message::user(content, attachments);
        let session = &mut self.sessions[index];
        if session.awaits_title() && !content.trim().is_empty() {
            session.title = derive_title(content);
        }
        session.push(message.clone());

        self.persist()?;
        self.in_flight.insert(session_id.to_string());
        Ok(Some(message))
    }

    /// Appends an assistant reply and clears the session's busy flag.
    ///
    /// Empty content is replaced by [`EMPTY_REPLY_FALLBACK`]. Returns
    /// `Ok(None)` if the session no longer exists.
    pub fn append_assistant_message(
        &mut self,
        session_id: &str,
        content: &str,
    ) -> Result<Option<Message>> {
        let content = if content.is_empty() {
            EMPTY_REPLY_FALLBACK
        } else {
            content
        };
        self.append_reply(session_id, Message::assistant(content))
    }

    /// Appends the fixed failure reply and clears the session's busy flag.
    pub fn append_error_message(&mut self, session_id: &str) -> Result<Option<Message>> {
        self.append_reply(session_id, Message::assistant(ERROR_REPLY))
    }

    fn append_reply(&mut self, session_id: &str, message: Message) -> Result<Option<Message>> {
        debug_assert_eq!(message.role, MessageRole::Assistant);
        self.in_flight.remove(session_id);

        let Some(index) = self.position(session_id) else {
            tracing::warn!(
                "[SessionStore] Reply for deleted session {} discarded",
                session_id
            );
            return Ok(None);
        };

        self.sessions[index].push(message.clone());
        self.persist()?;
        Ok(Some(message))
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    fn persist(&self) -> Result<()> {
        self.repository.save(&self.snapshot()).map_err(|e| {
            tracing::error!("[SessionStore] Failed to persist state: {}", e);
            e
        })
    }
}
