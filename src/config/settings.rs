//! Application settings and configuration types.
//!
//! Settings are persisted to `~/.config/edugen/settings.json` (or the platform
//! equivalent) and loaded at startup. A missing file means defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::ai::{GEMINI_DEFAULT_MODEL, OPENAI_BASE_URL};
use crate::providers::mail::MAILTM_BASE_URL;
use crate::services::{DEFAULT_SESSION_KEY, DEFAULT_TIP_CATEGORY};

/// File name inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Errors from loading, saving or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Top-level application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mail provider connection.
    pub mail: MailSettings,
    /// Inbox polling.
    pub inbox: InboxSettings,
    /// Tip generation.
    pub ai: AiSettings,
    /// Session persistence.
    pub session: SessionSettings,
}

/// Mail provider connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// REST API base URL.
    pub base_url: String,
    /// Per-request timeout in seconds. `None` keeps the transport default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            base_url: MAILTM_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl MailSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Inbox polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxSettings {
    /// Seconds between list fetches.
    pub poll_interval_secs: u64,
}

impl Default for InboxSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
        }
    }
}

impl InboxSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Which LLM backend generates tips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    OpenAi,
}

/// Tip generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Master switch; disabled means the fallback tips are always used.
    pub enabled: bool,
    pub provider: AiProviderKind,
    /// Model identifier.
    pub model: String,
    /// Custom API endpoint.
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Topic the tips are about.
    pub tip_category: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: AiProviderKind::Gemini,
            model: GEMINI_DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            tip_category: DEFAULT_TIP_CATEGORY.to_string(),
        }
    }
}

impl AiSettings {
    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Base URL for the OpenAI-compatible provider.
    pub fn openai_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Key the session snapshot is stored under.
    pub storage_key: String,
    /// Pause between a successful generation and committing it.
    pub commit_delay_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_SESSION_KEY.to_string(),
            commit_delay_ms: 0,
        }
    }
}

impl Settings {
    /// Default location: `<config_dir>/edugen/settings.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "edugen", "edugen").ok_or(SettingsError::NoConfigDir)?;
        Ok(dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Loads from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Loads from `path`, returning defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes pretty-printed JSON to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Writes pretty-printed JSON to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, json).map_err(write_err)
    }

    /// Checks values serde cannot check.
    pub fn validate(&self) -> Result<()> {
        if self.inbox.poll_interval_secs == 0 {
            return Err(SettingsError::Invalid {
                field: "inbox.poll_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        check_url("mail.base_url", &self.mail.base_url)?;
        if let Some(base_url) = &self.ai.base_url {
            check_url("ai.base_url", base_url)?;
        }

        crate::storage::validate_key(&self.session.storage_key).map_err(|e| {
            SettingsError::Invalid {
                field: "session.storage_key",
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).map_err(|e| SettingsError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SettingsError::Invalid {
            field,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
