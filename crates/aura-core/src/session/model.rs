//! Chat session model.

use super::message::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to freshly created sessions until the first user message arrives.
pub const DEFAULT_SESSION_TITLE: &str = "New Neural Link";

/// Fixed title of sessions produced by importing a share link.
pub const SHARED_SESSION_TITLE: &str = "Shared Session";

/// Assistant message every new session starts with.
pub const WELCOME_MESSAGE: &str = "Aura AI is online. I am your high-performance synthetic assistant. Upload any file or send a command to begin.";

/// Number of characters of the first user message kept in a derived title.
pub const TITLE_MAX_CHARS: usize = 30;

/// One conversation thread.
///
/// `messages` is append-only and chronological. Sessions created through
/// [`ChatSession::new`] always start with the welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Globally unique identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// Creation time (epoch milliseconds)
    pub created_at: i64,
    /// Time of the last append (epoch milliseconds)
    pub updated_at: i64,
}

impl ChatSession {
    /// Creates a session seeded with the welcome message.
    pub fn new() -> Self {
        let now = super::now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a session from a shared message list.
    pub fn imported(messages: Vec<Message>) -> Self {
        let now = super::now_millis();
        Self {
            id: format!("shared-{}", Uuid::new_v4()),
            title: SHARED_SESSION_TITLE.to_string(),
            messages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and refreshes `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = super::now_millis();
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(Message::is_user)
    }

    /// Whether the next user message should rename the session.
    ///
    /// Only sessions still carrying the placeholder title and holding no user
    /// message are renamed; imported sessions keep their fixed label.
    pub fn awaits_title(&self) -> bool {
        self.title == DEFAULT_SESSION_TITLE && !self.has_user_message()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a session title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters and appends `...` when the
/// message is longer.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
