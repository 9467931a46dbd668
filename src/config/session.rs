//! Session and list-view configuration

use serde::Deserialize;
use std::time::Duration;

use crate::collection::DEFAULT_PAGE_SIZE;

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session lifecycle settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Seconds between proactive token refreshes
    pub refresh_interval_secs: u64,
    /// Check a stored token against the backend before trusting it
    pub validate_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 14 * 60,
            validate_on_start: true,
        }
    }
}

/// Session settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileSessionConfig {
    pub refresh_interval_secs: Option<u64>,
    pub validate_on_start: Option<bool>,
}

impl SessionConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileSessionConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            // A zero interval would spin the refresh task
            refresh_interval_secs: file
                .refresh_interval_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.refresh_interval_secs),
            validate_on_start: file.validate_on_start.unwrap_or(defaults.validate_on_start),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Views Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ViewsConfig {
    /// Rows per page on list screens
    pub page_size: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileViewsConfig {
    pub page_size: Option<usize>,
}

impl ViewsConfig {
    pub fn from_file(file: Option<FileViewsConfig>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            page_size: file
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}
