//! Conversation message types.

use crate::attachment::Attachment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

impl MessageRole {
    /// Lower-case wire name (`user` / `assistant`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single message in a chat session.
///
/// Messages are created once and never edited. `attachments` is only present
/// on user messages that carried uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier, unique within its session
    pub id: String,
    /// Who wrote the message
    pub role: MessageRole,
    /// Message body
    pub content: String,
    /// Creation time (epoch milliseconds)
    pub timestamp: i64,
    /// Files sent along with a user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    /// Creates a user message. An empty attachment list is stored as `None`.
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: super::now_millis(),
            attachments: (!attachments.is_empty()).then_some(attachments),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: super::now_millis(),
            attachments: None,
        }
    }

    /// Attachments as a slice (empty when there are none).
    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.as_deref().unwrap_or_default()
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}
