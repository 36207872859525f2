//! Client settings
//!
//! Loaded from a YAML file; secrets come from `.env` / the environment.
//!
//! ```yaml
//! url: "http://localhost:5000/chathub"
//! user_name: "rustacean"
//! send_method: "send"
//! broadcast_method: "broadcastMessage"
//! server_timeout_ms: 30000
//! headers:
//!   X-Client: hub-chat
//! log_level: info
//! ```

use hubsockets::states::HasUrl;
use hubsockets::{HubConnection, HubConnectionBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable overriding `access_token`
pub const ACCESS_TOKEN_ENV: &str = "HUB_ACCESS_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings of the chat client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Hub URL (http/https, rewritten to ws/wss by the transport)
    pub url: String,

    /// Name sent as the first argument of every chat message
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Hub method invoked for outgoing messages
    #[serde(default = "default_send_method")]
    pub send_method: String,

    /// Client method the hub calls for incoming messages
    #[serde(default = "default_broadcast_method")]
    pub broadcast_method: String,

    #[serde(default)]
    pub skip_negotiate: bool,

    #[serde(default = "default_server_timeout_ms")]
    pub server_timeout_ms: u64,

    #[serde(default = "default_keep_alive_interval_ms")]
    pub keep_alive_interval_ms: u64,

    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Extra headers for negotiate and the WebSocket upgrade
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Bearer token; usually supplied through `HUB_ACCESS_TOKEN`
    #[serde(default)]
    pub access_token: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_user_name() -> String {
    "rustacean".to_string()
}

fn default_send_method() -> String {
    "send".to_string()
}

fn default_broadcast_method() -> String {
    "broadcastMessage".to_string()
}

fn default_server_timeout_ms() -> u64 {
    30_000
}

fn default_keep_alive_interval_ms() -> u64 {
    15_000
}

fn default_handshake_timeout_ms() -> u64 {
    15_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientSettings {
    /// Load settings from a YAML file and `.env`
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;

        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();

        let config = Self::from_yaml(&yaml_content)?
            .with_access_token_override(std::env::var(ACCESS_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse settings without touching the environment
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Replace the token when `token` is set and non-empty
    pub fn with_access_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            info!("Overriding access token from {}", ACCESS_TOKEN_ENV);
            self.access_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::ValidationError("url cannot be empty".to_string()));
        }

        for (name, value) in [
            ("server_timeout_ms", self.server_timeout_ms),
            ("keep_alive_interval_ms", self.keep_alive_interval_ms),
            ("handshake_timeout_ms", self.handshake_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.send_method.is_empty() || self.broadcast_method.is_empty() {
            return Err(ConfigError::ValidationError(
                "hub method names cannot be empty".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Builder preloaded with these settings
    pub fn connection_builder(&self) -> HubConnectionBuilder<HasUrl> {
        let mut builder = HubConnection::builder()
            .url(self.url.clone())
            .skip_negotiate(self.skip_negotiate)
            .server_timeout(Duration::from_millis(self.server_timeout_ms))
            .keep_alive_interval(Duration::from_millis(self.keep_alive_interval_ms))
            .handshake_timeout(Duration::from_millis(self.handshake_timeout_ms))
            .headers(self.headers.clone());

        if let Some(token) = &self.access_token {
            builder = builder.access_token(token.clone());
        }
        builder
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Hub URL: {}", self.url);
        info!("  User name: {}", self.user_name);
        info!("  Methods: send='{}', broadcast='{}'", self.send_method, self.broadcast_method);
        info!("  Skip negotiate: {}", self.skip_negotiate);
        info!(
            "  Timeouts: server={}ms keep-alive={}ms handshake={}ms",
            self.server_timeout_ms, self.keep_alive_interval_ms, self.handshake_timeout_ms
        );
        info!("  Access token: {}", if self.access_token.is_some() { "set" } else { "none" });
        info!("  Log level: {}", self.log_level);
    }
}
