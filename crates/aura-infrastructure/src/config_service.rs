//! Configuration service implementation.
//!
//! Loads `config.toml` and `secret.json` from the config directory. A missing
//! configuration file yields defaults; a missing API key is only an error
//! once a client actually needs it.

use crate::paths::AuraPaths;
use crate::storage::{AtomicFile, AtomicFileError};
use aura_core::config::{AuraConfig, SecretConfig};
use aura_core::error::{AuraError, Result};

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: AuraPaths,
}

impl ConfigService {
    pub fn new(paths: AuraPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AuraPaths {
        &self.paths
    }

    /// Loads `config.toml`, falling back to defaults when absent.
    pub fn load_config(&self) -> Result<AuraConfig> {
        let path = self.paths.config_file();
        let config = AtomicFile::<AuraConfig>::toml(path.clone())
            .load()
            .map_err(|e| config_error("config.toml", e))?;

        match config {
            Some(config) => {
                tracing::debug!("[ConfigService] Loaded {}", path.display());
                Ok(config)
            }
            None => {
                tracing::debug!(
                    "[ConfigService] {} not found, using defaults",
                    path.display()
                );
                Ok(AuraConfig::default())
            }
        }
    }

    /// Loads `secret.json`; a missing file is an empty secret set.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        AtomicFile::<SecretConfig>::json(self.paths.secret_file())
            .load()
            .map(Option::unwrap_or_default)
            .map_err(|e| config_error("secret.json", e))
    }

    /// Resolves the API key from the environment first, then `secret.json`.
    pub fn resolve_api_key(&self) -> Result<String> {
        let secrets = self.load_secrets()?;
        api_key_from(&secrets, |name| std::env::var(name).ok()).ok_or_else(|| {
            AuraError::config(format!(
                "No API key found. Set {} or add it to {}",
                API_KEY_ENV_VARS[0],
                self.paths.secret_file().display()
            ))
        })
    }
}

/// Picks the first non-blank key from `env`, then from `secrets`.
pub fn api_key_from<F>(secrets: &SecretConfig, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| env(name))
        .chain(secrets.gemini.iter().map(|g| g.api_key.clone()))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

fn config_error(file: &str, error: AtomicFileError) -> AuraError {
    AuraError::config(format!("Failed to load {file}: {error}"))
}
