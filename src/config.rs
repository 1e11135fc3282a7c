//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. the `--config` command line argument
//! 2. `$ATTACHFETCH_CONFIG` (environment variable)
//! 3. `~/.config/attachfetch/config.toml` (Linux/macOS)
//!    `%APPDATA%\attachfetch\config.toml` (Windows)
//!
//! ```toml
//! [auth]
//! server = "imap.gmail.com"
//! username = "me@example.com"
//! password = "app-password"
//!
//! [filter]
//! label = "Invoices"
//! to = "billing@example.com"
//!
//! [local]
//! directory = "/srv/invoices"
//! overwrite = false
//! ```
//!
//! Server, username, password, label and recipient have no defaults. A
//! missing file, a parse error, or any missing required field is an
//! [`Error::Config`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Mail server and credentials.
    pub auth: AuthConfig,
    /// Which folder and recipient to look at.
    pub filter: FilterConfig,
    /// Where attachments go.
    pub local: LocalConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override the directory the log file is written to.
    pub cache_dir: Option<PathBuf>,
}

/// Mail server and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// IMAPS host name.
    pub server: Option<String>,
    /// IMAPS port.
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Message selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Folder (Gmail: label) to search.
    pub label: Option<String>,
    /// Only messages addressed to this recipient.
    pub to: Option<String>,
}

/// Local storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Download directory.
    pub directory: PathBuf,
    /// Replace existing files with the same name.
    pub overwrite: bool,
}

/// Validated settings with every required field present.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub label: String,
    pub recipient: String,
    pub download_dir: PathBuf,
    pub overwrite: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: 993,
            username: None,
            password: None,
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            overwrite: true,
        }
    }
}

// ── Validation ──────────────────────────────────────────────────

impl Config {
    /// Check that all required fields are present (and non-blank).
    ///
    /// Every missing field is reported in one error so a user can fix the
    /// file in a single pass.
    pub fn validate(&self) -> Result<Settings> {
        let mut missing = Vec::new();
        let mut require = |value: &Option<String>, name: &'static str| -> String {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let server = require(&self.auth.server, "auth.server");
        let username = require(&self.auth.username, "auth.username");
        let password = require(&self.auth.password, "auth.password");
        let label = require(&self.filter.label, "filter.label");
        let recipient = require(&self.filter.to, "filter.to");

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Settings {
            server,
            port: self.auth.port,
            username,
            password,
            label,
            recipient,
            download_dir: self.local.directory.clone(),
            overwrite: self.local.overwrite,
        })
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `path`, or from the standard location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()
            .ok_or_else(|| Error::Config("could not determine config file path".into()))?,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("cannot read '{}': {e}", path.display())))?;
    let cfg = parse_config(&contents)
        .map_err(|e| Error::Config(format!("cannot parse '{}': {e}", path.display())))?;

    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Parse configuration from TOML text.
pub fn parse_config(contents: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("ATTACHFETCH_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("attachfetch").join("config.toml"))
}

/// Return the directory the log file is written to.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("attachfetch")
}
