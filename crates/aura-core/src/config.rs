//! Configuration models.
//!
//! `AuraConfig` is read from `config.toml`; `SecretConfig` from `secret.json`.
//! Every field has a default so a missing or partial file is valid.

use crate::gateway::{DEFAULT_MODEL, HISTORY_WINDOW, SamplingConfig};
use crate::knowledge::KnowledgeItem;
use serde::{Deserialize, Serialize};

/// Base URL share links are built on when none is configured.
pub const DEFAULT_SHARE_BASE_URL: &str = "https://aura.local/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    /// Model identifier sent to the generation API
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Number of prior messages sent as context
    pub history_window: usize,
    /// Link prefix used when sharing a conversation
    pub share_base_url: String,
    /// Knowledge base rendered into the system instruction
    #[serde(rename = "knowledge")]
    pub knowledge: Vec<KnowledgeItem>,
}

impl Default for AuraConfig {
    fn default() -> Self {
        let sampling = SamplingConfig::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            history_window: HISTORY_WINDOW,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            knowledge: Vec::new(),
        }
    }
}

impl AuraConfig {
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }
}

/// API credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
}
