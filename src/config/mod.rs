//! Configuration for the console
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/lungora/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod serialization;
mod session;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use session::{FileSessionConfig, FileViewsConfig, SessionConfig, ViewsConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment overrides
pub const ENV_API_URL: &str = "LUNGORA_API_URL";
pub const ENV_DATA_DIR: &str = "LUNGORA_DATA_DIR";
pub const ENV_TIMEOUT: &str = "LUNGORA_TIMEOUT_SECS";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL
    pub api_url: String,

    /// Where durable credentials and settings are kept
    pub data_dir: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Session lifecycle settings
    pub session: SessionConfig,

    /// List screen settings
    pub views: ViewsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session: SessionConfig::default(),
            views: ViewsConfig::default(),
            logging: LoggingConfig::under(&default_data_dir()),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("lungora"))
        .unwrap_or_else(|| PathBuf::from("./.lungora"))
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub data_dir: Option<String>,
    pub request_timeout_secs: Option<u64>,

    /// Optional [session] section
    pub session: Option<FileSessionConfig>,

    /// Optional [views] section
    pub views: Option<FileViewsConfig>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/lungora/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("lungora").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        // Config is optional, so failures here are ignored
        let _ = Self::write_default(&path);
    }

    /// Write the default template to `path`, replacing whatever is there
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default().to_toml())
    }

    /// Parse the config file at `path`. A missing file means all defaults;
    /// one that exists but does not parse is an error, since falling back
    /// would silently point the console at the wrong backend.
    pub(crate) fn read_file(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).with_context(|| {
                format!(
                    "Invalid config file {}\n  Check string quoting, true/false values and \
                     section names, or run `lungora config --reset`",
                    path.display()
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e).with_context(|| format!("Cannot read config file {}", path.display())),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) => Self::read_file(&path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // API URL: env > file > default
        let api_url = env(ENV_API_URL)
            .or(file.api_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        // Data directory: env > file > default
        let data_dir = env(ENV_DATA_DIR)
            .or(file.data_dir)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        // Timeout: env > file > default; zero would fail every request
        let request_timeout_secs = env(ENV_TIMEOUT)
            .and_then(|v| v.parse().ok())
            .or(file.request_timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.request_timeout_secs);

        Self {
            api_url,
            logging: LoggingConfig::from_file(file.logging, &data_dir),
            data_dir,
            request_timeout_secs,
            session: SessionConfig::from_file(file.session),
            views: ViewsConfig::from_file(file.views),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Durable credential file
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// How often the JSON log file starts over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl fmt::Display for LogRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        })
    }
}

/// Diagnostics for the console itself. Stderr carries warnings by default so
/// command output stays readable; the JSON file is opt-in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// File names are `<prefix>.<date>`
    pub file_prefix: String,
}

impl LoggingConfig {
    /// Defaults with log files kept next to the credentials
    fn under(data_dir: &Path) -> Self {
        Self {
            level: "warn".to_string(),
            file_enabled: false,
            file_dir: data_dir.join("logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "lungora".to_string(),
        }
    }

    fn from_file(file: Option<FileLogging>, data_dir: &Path) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::under(data_dir);

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file.file_dir.map(PathBuf::from).unwrap_or(defaults.file_dir),
            file_rotation: file.file_rotation.unwrap_or(defaults.file_rotation),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}

/// `[logging]` as written in the file; an unknown rotation is a parse error
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<LogRotation>,
    pub file_prefix: Option<String>,
}
