//! Startup wiring.
//!
//! Loads persisted sessions, connects the model gateway, and applies a share
//! link passed on startup before the first prompt is shown.

use crate::chat_service::{ChatService, ImportError, ImportedShare};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aura_core::attachment::Attachment;
use aura_core::config::AuraConfig;
use aura_core::gateway::{GatewayFailure, GenerativeGateway, ModelGateway, RequestBuilder};
use aura_core::knowledge::KnowledgeItem;
use aura_core::session::{ChatSession, Message, SessionStore, StateRepository};
use aura_interaction::GeminiApiClient;
use std::sync::Arc;

/// What happened during [`start`].
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Session imported from the startup share link
    pub imported: Option<ImportedShare>,
    /// Why the startup share link was not imported
    pub import_error: Option<ImportError>,
    /// Session created because none existed
    pub created: Option<ChatSession>,
}

/// Loads the session store, repairing a dangling current session.
pub fn load_store(repository: Arc<dyn StateRepository>) -> Result<SessionStore> {
    SessionStore::load(repository).context("Failed to load saved sessions")
}

/// Builds the production gateway for `config`.
pub fn connect_gateway(config: &AuraConfig, api_key: impl Into<String>) -> Arc<dyn ModelGateway> {
    let builder = RequestBuilder::new(config.model.clone())
        .with_sampling(config.sampling())
        .with_history_window(config.history_window);
    tracing::debug!("[Bootstrap] Using model {}", config.model);
    Arc::new(GenerativeGateway::new(GeminiApiClient::new(api_key), builder))
}

/// Gateway used when no API key is configured; every request fails.
pub struct UnconfiguredGateway;

#[async_trait]
impl ModelGateway for UnconfiguredGateway {
    async fn respond(
        &self,
        _prompt: &str,
        _prior: &[Message],
        _knowledge: &[KnowledgeItem],
        _attachments: &[Attachment],
    ) -> std::result::Result<String, GatewayFailure> {
        tracing::error!("[Gateway] No API key configured, request not sent");
        Err(GatewayFailure)
    }
}

/// Connects to the model when `api_key` resolved, otherwise goes offline.
pub fn connect_or_offline(
    config: &AuraConfig,
    api_key: aura_core::error::Result<String>,
) -> Arc<dyn ModelGateway> {
    match api_key {
        Ok(key) => connect_gateway(config, key),
        Err(e) => {
            tracing::warn!("[Bootstrap] {}", e);
            Arc::new(UnconfiguredGateway)
        }
    }
}

/// Imports `share_link` if given; otherwise makes sure a session exists.
///
/// A share link that fails to decode is reported, never fatal. If it leaves
/// the store empty, a fresh session is created so there is always something
/// to type into.
pub async fn start(service: &ChatService, share_link: Option<&str>) -> Result<StartupReport> {
    let mut report = StartupReport::default();

    if let Some(link) = share_link {
        match service.import_link(link).await {
            Ok(imported) => report.imported = Some(imported),
            Err(ImportError::Store(e)) => {
                return Err(e).context("Failed to save imported session");
            }
            Err(e) => {
                tracing::warn!("[Bootstrap] Share link ignored: {}", e);
                report.import_error = Some(e);
            }
        }
    }

    if report.imported.is_none() && service.sessions().await.is_empty() {
        let session = service
            .create_session()
            .await
            .context("Failed to create initial session")?;
        report.created = Some(session);
    }

    Ok(report)
}
