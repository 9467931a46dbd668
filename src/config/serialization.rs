//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::{Config, ENV_API_URL, ENV_DATA_DIR, ENV_TIMEOUT};

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# lungora console configuration

# Backend base URL (env: {env_url})
api_url = "{api_url}"

# Durable credentials and settings live here (env: {env_data})
data_dir = "{data_dir}"

# Per-request timeout in seconds (env: {env_timeout})
request_timeout_secs = {timeout}

# Session lifecycle
[session]
# Proactive token refresh period while logged in
refresh_interval_secs = {refresh_interval}
# Check a stored token with the backend before using it
validate_on_start = {validate}

# List screens
[views]
page_size = {page_size}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            env_url = ENV_API_URL,
            api_url = escape(&self.api_url),
            env_data = ENV_DATA_DIR,
            data_dir = escape(&self.data_dir.display().to_string()),
            env_timeout = ENV_TIMEOUT,
            timeout = self.request_timeout_secs,
            refresh_interval = self.session.refresh_interval_secs,
            validate = self.session.validate_on_start,
            page_size = self.views.page_size,
            log_level = escape(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = escape(&self.logging.file_dir.display().to_string()),
            log_file_rotation = self.logging.file_rotation,
            log_file_prefix = escape(&self.logging.file_prefix),
        )
    }
}

/// Escape a value for a TOML basic string (Windows paths carry backslashes)
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
