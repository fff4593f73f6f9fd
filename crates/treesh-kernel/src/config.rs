//! Configuration for treesh.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/treesh/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, SudoGuard};
use crate::state::paths;

/// Configuration for a treesh kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Store prefix holding the filesystem tree.
    #[serde(default = "default_fs_prefix")]
    pub fs_prefix: String,

    /// Store prefix of the flat ban list.
    #[serde(default = "default_ban_prefix")]
    pub ban_prefix: String,

    /// Store prefix for per-identity session state.
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,

    /// Token that marks a pipeline stage as elevated.
    #[serde(default = "default_elevate_keyword")]
    pub elevate_keyword: String,

    /// Hex SHA-256 of the elevation password. Without it nobody elevates.
    #[serde(default)]
    pub sudo_sha256: Option<String>,

    /// First line of every gateway reply.
    #[serde(default = "default_banner")]
    pub banner: String,

    /// Message prefix that routes chat input to the shell.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_fs_prefix() -> String {
    "shellFS".to_string()
}

fn default_ban_prefix() -> String {
    "ban".to_string()
}

fn default_session_prefix() -> String {
    "sessions".to_string()
}

fn default_elevate_keyword() -> String {
    "sudo".to_string()
}

fn default_banner() -> String {
    "Use /shell help to display help".to_string()
}

fn default_command_prefix() -> String {
    "/shell".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            fs_prefix: default_fs_prefix(),
            ban_prefix: default_ban_prefix(),
            session_prefix: default_session_prefix(),
            elevate_keyword: default_elevate_keyword(),
            sudo_sha256: None,
            banner: default_banner(),
            command_prefix: default_command_prefix(),
        }
    }
}

impl ShellConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        paths::config_dir().join("config.toml")
    }

    /// Set the elevation password, storing only its digest.
    pub fn with_sudo_password(mut self, password: &str) -> Self {
        self.sudo_sha256 = Some(hash_password(password));
        self
    }

    pub fn sudo_guard(&self) -> SudoGuard {
        SudoGuard::new(self.sudo_sha256.clone())
    }
}
