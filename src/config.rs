//! Configuration management for share-paste
//!
//! Handles loading and saving configuration from ~/.config/share-paste/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Application name for config directory
const APP_NAME: &str = "share-paste";

/// Port used when neither the CLI nor the config file picks one
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Keys accepted by `config set` / `config unset`
pub const CONFIG_KEYS: &[&str] = &[
    "default_port",
    "database_path",
    "public_url",
    "secure_cookies",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default port for the web server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u16>,

    /// SQLite database file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Public base URL prepended to share links (e.g. https://paste.example.com)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Mark the session cookie `Secure` (set when serving over HTTPS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_cookies: Option<bool>,

    /// Write logs to this file in addition to stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config file path
    ///
    /// Returns ~/.config/share-paste/config.toml on Linux/macOS
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Get the config directory path
    ///
    /// Returns ~/.config/share-paste on Linux/macOS
    pub fn config_dir() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME))
    }

    /// Load configuration from the default location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, defaulting when it is missing
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// Creates the parent directory if it doesn't exist
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check if any configuration is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set a key from its string form, as typed on the command line
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "default_port" => self.default_port = Some(value.parse().map_err(|_| invalid())?),
            "database_path" => self.database_path = Some(PathBuf::from(value)),
            "public_url" => self.public_url = Some(value.to_string()),
            "secure_cookies" => self.secure_cookies = Some(value.parse().map_err(|_| invalid())?),
            "log_file" => self.log_file = Some(value.to_string()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Clear a key
    pub fn unset(&mut self, key: &str) -> ConfigResult<()> {
        match key {
            "default_port" => self.default_port = None,
            "database_path" => self.database_path = None,
            "public_url" => self.public_url = None,
            "secure_cookies" => self.secure_cookies = None,
            "log_file" => self.log_file = None,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Get effective port: CLI argument, then config, then default
    pub fn effective_port(&self, cli_port: Option<u16>) -> u16 {
        cli_port.or(self.default_port).unwrap_or(DEFAULT_PORT)
    }

    /// Get effective database path: CLI argument, then config, then default
    pub fn effective_database_path(&self, cli_path: Option<PathBuf>) -> PathBuf {
        cli_path
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(crate::storage::default_db_path)
    }

    /// Whether session cookies should carry `Secure`
    pub fn effective_secure_cookies(&self, cli_flag: bool) -> bool {
        cli_flag || self.secure_cookies.unwrap_or(false)
    }
}

/// Format the configuration for display
pub fn format_config(config: &Config) -> String {
    let mut lines = Vec::new();

    lines.push("Current configuration:".to_string());
    lines.push(String::new());

    if let Some(port) = config.default_port {
        lines.push(format!("  default_port = {}", port));
    } else {
        lines.push(format!("  default_port = (not set, using {})", DEFAULT_PORT));
    }

    if let Some(ref path) = config.database_path {
        lines.push(format!("  database_path = \"{}\"", path.display()));
    } else {
        lines.push("  database_path = (not set, using default)".to_string());
    }

    if let Some(ref url) = config.public_url {
        lines.push(format!("  public_url = \"{}\"", url));
    } else {
        lines.push("  public_url = (not set, links are relative)".to_string());
    }

    match config.secure_cookies {
        Some(secure) => lines.push(format!("  secure_cookies = {}", secure)),
        None => lines.push("  secure_cookies = (not set, false)".to_string()),
    }

    if let Some(ref log_file) = config.log_file {
        lines.push(format!("  log_file = \"{}\"", log_file));
    } else {
        lines.push("  log_file = (not set)".to_string());
    }

    lines.join("\n")
}
