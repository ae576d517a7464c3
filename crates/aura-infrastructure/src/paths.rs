//! Unified path management for aura configuration and data files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use aura_core::config::{GeminiConfig, SecretConfig};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "aura";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for aura.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/aura/              # Config directory
/// ├── config.toml              # Application configuration
/// ├── secret.json              # API keys
/// └── logs/                    # Application logs
///     └── aura.log.YYYY-MM-DD
///
/// ~/.local/share/aura/         # Data directory
/// ├── sessions.json            # All chat sessions
/// └── last-active-session      # ID of the active session
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuraPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AuraPaths {
    /// Resolves the platform directories.
    ///
    /// `data_dir` overrides where sessions are stored; configuration always
    /// comes from the platform config directory.
    ///
    /// # Returns
    ///
    /// - `Ok(AuraPaths)`: Paths resolved
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directories
    pub fn resolve(data_dir: Option<&Path>) -> Result<Self, PathError> {
        let config_dir = dirs::config_dir()
            .ok_or(PathError::HomeDirNotFound)?
            .join(APP_DIR);
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir()
                .ok_or(PathError::HomeDirNotFound)?
                .join(APP_DIR),
        };

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Places both config and data under `root` (used by tests and portable setups).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path to the main configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    /// Returns the path to the JSON array of sessions.
    pub fn sessions_file(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }

    /// Returns the path holding the last active session ID.
    pub fn active_session_file(&self) -> PathBuf {
        self.data_dir.join("last-active-session")
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    /// Ensures the secret file exists, creating it with a template if it doesn't.
    ///
    /// This function sets file permissions to 600 (user read/write only) on Unix systems.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the secret file (existing or newly created)
    /// - `Err(std::io::Error)`: If file creation or permission setting fails
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self.secret_file();
        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
            }),
        };
        let template_json =
            serde_json::to_string_pretty(&template_config).map_err(std::io::Error::other)?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}
