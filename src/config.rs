//! Configuration management for opensky-impala.
//!
//! Handles loading the server address and credentials from a TOML file and
//! environment variables. The loaded [`Config`] is passed explicitly to the
//! connection layer; nothing here is process-global.

use crate::error::{ImpalaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default Impala shell host.
pub const DEFAULT_HOST: &str = "data.opensky-network.org";

/// Default Impala shell SSH port.
pub const DEFAULT_PORT: u16 = 2230;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Impala shell server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Address and credentials of the remote Impala shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// SSH host.
    #[serde(default = "default_host")]
    pub host: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Account name.
    #[serde(default)]
    pub username: String,

    /// Account password.
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ServerConfig {
    /// Creates a server config with the default host and port.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Checks that both username and password are present.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ImpalaError::config(
                "Impala username and password must not be empty",
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ImpalaError::config("Impala host must not be empty"));
        }
        Ok(())
    }

    /// Applies `OPENSKY_*` environment variables on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored so that an exported but blank variable does
    /// not wipe out a configured credential.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = get("OPENSKY_HOST") {
            self.host = host;
        }
        if let Some(port) = get("OPENSKY_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(username) = get("OPENSKY_USERNAME") {
            self.username = username;
        }
        if let Some(password) = get("OPENSKY_PASSWORD") {
            self.password = password;
        }
    }

    /// Returns a display-safe string (no password) for logs and messages.
    pub fn display_string(&self) -> String {
        if self.username.is_empty() {
            format!("{}:{}", self.host, self.port)
        } else {
            format!("{}@{}:{}", self.username, self.host, self.port)
        }
    }
}

/// Template written when no config file exists yet.
const CONFIG_TEMPLATE: &str = r#"[server]
host = "data.opensky-network.org"
port = 2230
username = ""
password = ""
"#;

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("opensky-impala")
            .join("secret.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is replaced by a template with empty credentials, which
    /// the user is expected to fill in.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            write_template(path)?;
            info!("Created config template at {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ImpalaError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Loads the file, applies environment overrides and validates credentials.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.server.apply_env_overrides();
        config.server.validate().map_err(|e| match e {
            ImpalaError::Config(msg) => {
                ImpalaError::config(format!("{msg} (edit {})", path.display()))
            }
            other => other,
        })?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ImpalaError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}

fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ImpalaError::config(format!("Failed to create config directory: {e}")))?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .map_err(|e| ImpalaError::config(format!("Failed to write config template: {e}")))
}
