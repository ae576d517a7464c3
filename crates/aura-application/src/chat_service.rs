//! Chat use case.
//!
//! `ChatService` coordinates the [`SessionStore`] with the [`ModelGateway`]:
//! it appends the user turn, calls the model without holding the store lock,
//! then appends the reply to the session the request was addressed to.

use aura_core::attachment::Attachment;
use aura_core::error::Result;
use aura_core::gateway::{GatewayFailure, ModelGateway};
use aura_core::knowledge::KnowledgeItem;
use aura_core::session::{ChatSession, Message, SessionStore};
use aura_core::share::{self, DecodeError};
use aura_core::transcript::{self, Transcript};
use aura_core::{AuraError, config::AuraConfig};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Result of a send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Nothing was sent: blank input, a busy session, or a session that is
    /// not the current one.
    Rejected,
    /// The model answered and the reply was appended.
    Replied { user: Message, reply: Message },
    /// The gateway failed; the fixed error reply was appended.
    Failed {
        user: Message,
        reply: Message,
        error: GatewayFailure,
    },
    /// The session was deleted while the request was outstanding.
    Discarded { user: Message },
}

/// A user turn that has been appended and is waiting for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    session_id: String,
    user: Message,
    prior: Vec<Message>,
}

impl PendingReply {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user(&self) -> &Message {
        &self.user
    }
}

/// Reasons a share link import is abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("link has no '#chat=' fragment")]
    NotAShareLink,

    #[error("shared conversation could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] AuraError),
}

/// A conversation imported from a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedShare {
    pub session: ChatSession,
    /// The link with its fragment removed
    pub clean_link: String,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<Mutex<SessionStore>>,
    gateway: Arc<dyn ModelGateway>,
    knowledge: Arc<[KnowledgeItem]>,
    share_base_url: String,
}

impl ChatService {
    pub fn new(
        store: SessionStore,
        gateway: Arc<dyn ModelGateway>,
        knowledge: Vec<KnowledgeItem>,
        share_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gateway,
            knowledge: knowledge.into(),
            share_base_url: share_base_url.into(),
        }
    }

    /// Builds the service from the knowledge base and share URL in `config`.
    pub fn from_config(
        store: SessionStore,
        gateway: Arc<dyn ModelGateway>,
        config: &AuraConfig,
    ) -> Self {
        Self::new(
            store,
            gateway,
            config.knowledge.clone(),
            config.share_base_url.clone(),
        )
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.store.lock().await.sessions().to_vec()
    }

    pub async fn current_session(&self) -> Option<ChatSession> {
        self.store.lock().await.current_session().cloned()
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.store
            .lock()
            .await
            .current_session_id()
            .map(str::to_string)
    }

    pub async fn is_busy(&self, session_id: &str) -> bool {
        self.store.lock().await.is_busy(session_id)
    }

    // ============================================================================
    // Session management
    // ============================================================================

    pub async fn create_session(&self) -> Result<ChatSession> {
        self.store.lock().await.create_session()
    }

    pub async fn select_session(&self, id: &str) -> Result<bool> {
        self.store.lock().await.select_session(id)
    }

    pub async fn delete_session(&self, id: &str) -> Result<bool> {
        self.store.lock().await.delete_session(id)
    }

    pub async fn clear_all(&self) -> Result<ChatSession> {
        self.store.lock().await.clear_all()
    }

    // ============================================================================
    // Messaging
    // ============================================================================

    /// Sends a user turn to `session_id` and waits for the reply.
    ///
    /// The store lock is released while the model is generating, so other
    /// sessions stay usable and the user may switch away; the reply still
    /// lands in `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store cannot persist a change.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<SendOutcome> {
        match self.submit(session_id, text, attachments).await? {
            Some(pending) => self.complete(pending).await,
            None => Ok(SendOutcome::Rejected),
        }
    }

    /// Appends the user turn without calling the model.
    ///
    /// Returns `None` when the turn is rejected (blank input, a busy session,
    /// or a session that is not current); nothing changes in that case.
    pub async fn submit(
        &self,
        session_id: &str,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Option<PendingReply>> {
        let mut store = self.store.lock().await;
        let prior = store
            .session(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();
        Ok(store
            .append_user_message(session_id, text, attachments)?
            .map(|user| PendingReply {
                session_id: session_id.to_string(),
                user,
                prior,
            }))
    }

    /// Asks the model for the reply to a submitted turn and appends it.
    pub async fn complete(&self, pending: PendingReply) -> Result<SendOutcome> {
        let PendingReply {
            session_id,
            user,
            prior,
        } = pending;

        tracing::debug!(
            "[ChatService] Sending to {} with {} prior messages",
            session_id,
            prior.len()
        );
        let result = self
            .gateway
            .respond(&user.content, &prior, &self.knowledge, user.attachments())
            .await;

        let mut store = self.store.lock().await;
        match result {
            Ok(reply) => Ok(match store.append_assistant_message(&session_id, &reply)? {
                Some(reply) => SendOutcome::Replied { user, reply },
                None => SendOutcome::Discarded { user },
            }),
            Err(error) => {
                tracing::warn!("[ChatService] {}", error);
                Ok(match store.append_error_message(&session_id)? {
                    Some(reply) => SendOutcome::Failed { user, reply, error },
                    None => SendOutcome::Discarded { user },
                })
            }
        }
    }

    /// Sends to whichever session is current.
    pub async fn send_to_current(
        &self,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<SendOutcome> {
        match self.current_session_id().await {
            Some(id) => self.send_message(&id, text, attachments).await,
            None => Ok(SendOutcome::Rejected),
        }
    }

    // ============================================================================
    // Export and sharing
    // ============================================================================

    /// Renders the current session as a transcript, if it has messages.
    pub async fn export_current(&self) -> Option<Transcript> {
        let store = self.store.lock().await;
        store.current_session().and_then(transcript::export)
    }

    /// Builds a share link for the current session.
    pub async fn share_current(&self) -> Result<Option<String>> {
        let store = self.store.lock().await;
        store
            .current_session()
            .map(|session| share::share_link(&self.share_base_url, &session.messages))
            .transpose()
    }

    /// Imports the conversation carried in `link` as a new current session.
    ///
    /// A malformed fragment leaves the sessions untouched.
    pub async fn import_link(&self, link: &str) -> std::result::Result<ImportedShare, ImportError> {
        let (base, fragment) = share::split_fragment(link.trim());
        let fragment = fragment
            .filter(|f| share::is_share_fragment(f))
            .ok_or(ImportError::NotAShareLink)?;

        let messages = share::decode_fragment(fragment).map_err(|e| {
            tracing::error!("[ChatService] Failed to decode shared chat: {}", e);
            e
        })?;

        let session = self.store.lock().await.import_session(messages)?;
        tracing::info!(
            "[ChatService] Imported {} messages into {}",
            session.messages.len(),
            session.id
        );
        Ok(ImportedShare {
            session,
            clean_link: base.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aura_core::session::{ERROR_REPLY, InMemoryStateRepository, SHARED_SESSION_TITLE};
    use std::sync::Mutex as StdMutex;

    // Gateway stub returning scripted replies and recording prompts
    #[derive(Default)]
    struct ScriptedGateway {
        replies: StdMutex<Vec<std::result::Result<String, GatewayFailure>>>,
        seen: StdMutex<Vec<(String, usize)>>,
    }

    impl ScriptedGateway {
        fn replying(replies: Vec<std::result::Result<String, GatewayFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies),
                seen: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn respond(
            &self,
            prompt: &str,
            prior: &[Message],
            _knowledge: &[KnowledgeItem],
            _attachments: &[Attachment],
        ) -> std::result::Result<String, GatewayFailure> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), prior.len()));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok("ok".to_string())
            } else {
                replies.remove(0)
            }
        }
    }

    async fn service(gateway: Arc<ScriptedGateway>) -> ChatService {
        let store = SessionStore::new(Arc::new(InMemoryStateRepository::new()));
        let service = ChatService::new(store, gateway, Vec::new(), "https://aura.local/");
        service.create_session().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_send_appends_user_and_reply() {
        let gateway = ScriptedGateway::replying(vec![Ok("Hello, human.".to_string())]);
        let service = service(gateway.clone()).await;

        let outcome = service.send_to_current("Hi", Vec::new()).await.unwrap();

        let SendOutcome::Replied { user, reply } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(user.content, "Hi");
        assert_eq!(reply.content, "Hello, human.");

        let session = service.current_session().await.unwrap();
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.title, "Hi");
        // Prior history is the welcome message only
        assert_eq!(gateway.seen.lock().unwrap()[0], ("Hi".to_string(), 1));
    }

    #[tokio::test]
    async fn test_gateway_failure_appends_error_reply() {
        let gateway = ScriptedGateway::replying(vec![Err(GatewayFailure)]);
        let service = service(gateway).await;
        let id = service.current_session_id().await.unwrap();

        let outcome = service.send_message(&id, "Hi", Vec::new()).await.unwrap();

        assert!(matches!(outcome, SendOutcome::Failed { ref reply, .. } if reply.content == ERROR_REPLY));
        assert!(!service.is_busy(&id).await);
    }

    #[tokio::test]
    async fn test_blank_send_is_rejected() {
        let gateway = ScriptedGateway::replying(Vec::new());
        let service = service(gateway.clone()).await;

        let outcome = service.send_to_current("  ", Vec::new()).await.unwrap();

        assert_eq!(outcome, SendOutcome::Rejected);
        assert!(gateway.seen.lock().unwrap().is_empty());
        assert_eq!(service.current_session().await.unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_to_non_current_session_changes_nothing() {
        let gateway = ScriptedGateway::replying(Vec::new());
        let service = service(gateway.clone()).await;
        let first = service.current_session_id().await.unwrap();
        service.create_session().await.unwrap();

        let pending = service.submit(&first, "Hi", Vec::new()).await.unwrap();

        assert!(pending.is_none());
        assert!(!service.is_busy(&first).await);
        let sessions = service.sessions().await;
        assert!(sessions.iter().all(|s| s.messages.len() == 1));
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submitted_turn_completes_after_switching_away() {
        let gateway = ScriptedGateway::replying(vec![Ok("Later.".to_string())]);
        let service = service(gateway).await;
        let first = service.current_session_id().await.unwrap();

        let pending = service
            .submit(&first, "Hi", Vec::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.session_id(), first);
        assert_eq!(pending.user().content, "Hi");
        assert!(service.is_busy(&first).await);

        let second = service.create_session().await.unwrap();
        let outcome = service.complete(pending).await.unwrap();

        assert!(matches!(outcome, SendOutcome::Replied { ref reply, .. } if reply.content == "Later."));
        assert_eq!(service.current_session_id().await.unwrap(), second.id);
        let sessions = service.sessions().await;
        let first_session = sessions.iter().find(|s| s.id == first).unwrap();
        assert_eq!(first_session.messages.len(), 3);
        assert!(!service.is_busy(&first).await);
    }

    #[tokio::test]
    async fn test_export_and_share_current() {
        let service = service(ScriptedGateway::replying(Vec::new())).await;

        let transcript = service.export_current().await.unwrap();
        assert!(transcript.body.contains("ASSISTANT:"));

        let link = service.share_current().await.unwrap().unwrap();
        assert!(link.starts_with("https://aura.local/#chat="));
    }

    #[tokio::test]
    async fn test_import_link_creates_shared_session() {
        let service = service(ScriptedGateway::replying(Vec::new())).await;
        let messages = vec![Message::user("shared question", Vec::new())];
        let link = share::share_link("https://aura.local/app?x=1", &messages).unwrap();

        let imported = service.import_link(&link).await.unwrap();

        assert_eq!(imported.clean_link, "https://aura.local/app?x=1");
        assert_eq!(imported.session.title, SHARED_SESSION_TITLE);
        assert_eq!(imported.session.messages, messages);
        assert_eq!(
            service.current_session_id().await.as_deref(),
            Some(imported.session.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_malformed_import_leaves_sessions_untouched() {
        let service = service(ScriptedGateway::replying(Vec::new())).await;
        let before = service.sessions().await;

        let err = service
            .import_link("https://aura.local/#chat=not-valid-base64!!")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Decode(DecodeError::InvalidBase64(_))));

        let err = service.import_link("https://aura.local/").await.unwrap_err();
        assert_eq!(err, ImportError::NotAShareLink);

        assert_eq!(service.sessions().await, before);
    }
}
