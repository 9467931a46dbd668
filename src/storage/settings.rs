//! Dashboard branding persisted in the durable scope

use serde::{Deserialize, Serialize};

/// Name, description and logo shown in the dashboard chrome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Logo URL or data URI
    #[serde(default)]
    pub logo: Option<String>,
}

fn default_name() -> String {
    "Lungora".to_string()
}

fn default_description() -> String {
    "Lung disease triage dashboard".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            logo: None,
        }
    }
}
