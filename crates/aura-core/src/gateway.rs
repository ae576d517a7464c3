//! Model gateway.
//!
//! Builds the provider-neutral [`GenerationRequest`] for a turn and maps the
//! outcome of the external generation call. The HTTP client itself lives
//! behind [`GenerationClient`]; callers talk to [`ModelGateway`].

use crate::attachment::Attachment;
use crate::knowledge::{KnowledgeItem, knowledge_context};
use crate::session::{EMPTY_REPLY_FALLBACK, Message, MessageRole};
use async_trait::async_trait;
use thiserror::Error;

/// Model identifier used unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Maximum number of prior messages sent with a request.
pub const HISTORY_WINDOW: usize = 10;

const PERSONA_INSTRUCTION: &str = "You are Aura AI, a highly advanced synthetic intelligence.
Your tone is sleek, insightful, and precise. You represent the cutting edge of AI assistance.
You have access to a neural knowledge base context below. Cite sources when relevant.";

const UPLOAD_INSTRUCTION: &str =
    "When users upload files, analyze them thoroughly within the context of their request.";

// ============================================================================
// Request model
// ============================================================================

/// Author of a content turn as the model API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

impl From<MessageRole> for TurnRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => TurnRole::User,
            MessageRole::Assistant => TurnRole::Model,
        }
    }
}

/// One piece of a content turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Base64 binary data tagged with its media type
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.75,
            top_p: 0.9,
        }
    }
}

/// Everything the external generation function receives.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    /// History window followed by the current user turn
    pub contents: Vec<Turn>,
    pub system_instruction: String,
    pub sampling: SamplingConfig,
}

// ============================================================================
// Request building
// ============================================================================

/// Builds generation requests with a fixed model, sampling and history window.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBuilder {
    model: String,
    sampling: SamplingConfig,
    history_window: usize,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sampling: SamplingConfig::default(),
            history_window: HISTORY_WINDOW,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Builds the request for one user turn.
    ///
    /// Only the last `history_window` entries of `prior` are kept; older
    /// messages are dropped, not summarized.
    pub fn build(
        &self,
        prompt: &str,
        prior: &[Message],
        knowledge: &[KnowledgeItem],
        attachments: &[Attachment],
    ) -> GenerationRequest {
        let start = prior.len().saturating_sub(self.history_window);
        let mut contents: Vec<Turn> = prior[start..]
            .iter()
            .map(|message| Turn {
                role: message.role.into(),
                parts: message_parts(&message.content, message.attachments()),
            })
            .collect();

        contents.push(Turn {
            role: TurnRole::User,
            parts: message_parts(prompt, attachments),
        });

        GenerationRequest {
            model: self.model.clone(),
            contents,
            system_instruction: system_instruction(knowledge),
            sampling: self.sampling,
        }
    }
}

/// The persona instruction with the knowledge-base block embedded.
pub fn system_instruction(knowledge: &[KnowledgeItem]) -> String {
    format!(
        "{PERSONA_INSTRUCTION}\n{}\n\n{UPLOAD_INSTRUCTION}",
        knowledge_context(knowledge)
    )
}

/// Expands a message body and its attachments into content parts.
///
/// Blank text is left out when attachments carry the turn, so no turn is
/// ever sent without parts.
pub fn message_parts(content: &str, attachments: &[Attachment]) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    if !content.trim().is_empty() || attachments.is_empty() {
        parts.push(ContentPart::Text(content.to_string()));
    }
    parts.extend(attachments.iter().map(attachment_part));
    parts
}

/// Images become inline binary parts; other files become text parts.
pub fn attachment_part(attachment: &Attachment) -> ContentPart {
    if attachment.is_image {
        ContentPart::InlineData {
            mime_type: attachment.mime_type.clone(),
            data: attachment.payload.clone(),
        }
    } else {
        ContentPart::Text(attachment.as_prompt_text())
    }
}

// ============================================================================
// Boundaries
// ============================================================================

/// Failure reported by a [`GenerationClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "generation failed{}: {}",
    .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(),
    .message
)]
pub struct GenerationError {
    /// HTTP status, if the request reached the server
    pub status: Option<u16>,
    pub message: String,
    pub retryable: bool,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            retryable: false,
        }
    }
}

/// The external generation function.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends `request` and returns the model's text (possibly empty).
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Single, generic failure surfaced to callers of [`ModelGateway::respond`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Neural link disrupted. Attempting to re-establish connection...")]
pub struct GatewayFailure;

/// Produces the assistant reply for one user turn.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn respond(
        &self,
        prompt: &str,
        prior: &[Message],
        knowledge: &[KnowledgeItem],
        attachments: &[Attachment],
    ) -> Result<String, GatewayFailure>;
}

/// [`ModelGateway`] that builds requests and forwards them to a client.
///
/// Failures are not retried; they collapse into [`GatewayFailure`].
pub struct GenerativeGateway<C> {
    client: C,
    builder: RequestBuilder,
}

impl<C: GenerationClient> GenerativeGateway<C> {
    pub fn new(client: C, builder: RequestBuilder) -> Self {
        Self { client, builder }
    }
}

#[async_trait]
impl<C: GenerationClient> ModelGateway for GenerativeGateway<C> {
    async fn respond(
        &self,
        prompt: &str,
        prior: &[Message],
        knowledge: &[KnowledgeItem],
        attachments: &[Attachment],
    ) -> Result<String, GatewayFailure> {
        let request = self.builder.build(prompt, prior, knowledge, attachments);
        tracing::debug!(
            "[Gateway] Sending {} turns to {}",
            request.contents.len(),
            request.model
        );

        match self.client.generate(&request).await {
            Ok(text) if text.is_empty() => Ok(EMPTY_REPLY_FALLBACK.to_string()),
            Ok(text) => Ok(text),
            Err(err) => {
                tracing::error!("[Gateway] Generation failed: {}", err);
                Err(GatewayFailure)
            }
        }
    }
}
