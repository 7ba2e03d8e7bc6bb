//! Shared configuration for the relay directory tools.
//!
//! TOML settings file + `RELAYDIR_*` environment overrides, table-name
//! defaults matching the hosted backend, and translation to
//! `relaydir_api::ClientConfig`.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use relaydir_api::ClientConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured (set api_key or RELAYDIR_API_KEY)")]
    MissingKey,

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Top-level settings, loadable from `settings.toml` and `RELAYDIR_*`
/// environment variables. Table names default to the hosted backend's
/// views so only the URL and key are required.
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Backend base URL (e.g., "https://xyz.supabase.co").
    pub backend_url: String,

    /// Public anon API key (plaintext — prefer RELAYDIR_API_KEY).
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_servers_table")]
    pub servers_table: String,

    #[serde(default = "default_server_statuses_table")]
    pub server_statuses_table: String,

    #[serde(default = "default_bots_table")]
    pub bots_table: String,

    #[serde(default = "default_bot_statuses_table")]
    pub bot_statuses_table: String,

    #[serde(default = "default_bot_details_table")]
    pub bot_details_table: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Root directory for locally persisted stores. Defaults to the
    /// platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            api_key: String::new(),
            servers_table: default_servers_table(),
            server_statuses_table: default_server_statuses_table(),
            bots_table: default_bots_table(),
            bot_statuses_table: default_bot_statuses_table(),
            bot_details_table: default_bot_details_table(),
            timeout_secs: default_timeout(),
            data_dir: None,
        }
    }
}

fn default_servers_table() -> String {
    "servers_view".into()
}
fn default_server_statuses_table() -> String {
    "server_status".into()
}
fn default_bots_table() -> String {
    "v_bot_summaries".into()
}
fn default_bot_statuses_table() -> String {
    "bot_statuses".into()
}
fn default_bot_details_table() -> String {
    "bots".into()
}
fn default_timeout() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    ProjectDirs::from("org", "relaydir", "relaydir").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("settings.toml");
            p
        },
        |dirs| dirs.config_dir().join("settings.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("relaydir");
    p
}

// ── Loading and saving ──────────────────────────────────────────────

impl Settings {
    /// Load settings from defaults, the settings file, and the
    /// environment, in increasing precedence.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&settings_path())
    }

    /// Same as [`load`](Self::load) with an explicit file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RELAYDIR_"));

        let settings: Self = figment.extract()?;
        Ok(settings)
    }

    /// Serialize to TOML and write to the canonical settings path.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(&path, toml_str)?;
        Ok(())
    }

    /// Validate and translate into the api crate's client config.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let base_url: url::Url =
            self.backend_url
                .parse()
                .map_err(|_| ConfigError::Validation {
                    field: "backend_url".into(),
                    reason: format!("invalid URL: {}", self.backend_url),
                })?;

        if self.api_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(ClientConfig {
            base_url,
            api_key: SecretString::from(self.api_key.clone()),
            timeout: Some(Duration::from_secs(self.timeout_secs)),
        })
    }

    /// Root directory for the file-backed local stores.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("org", "relaydir", "relaydir").map_or_else(
                || {
                    let mut p = dirs_fallback();
                    p.push("data");
                    p
                },
                |dirs| dirs.data_dir().to_path_buf(),
            )
        })
    }
}
