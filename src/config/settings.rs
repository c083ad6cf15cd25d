use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::EmptyMatchPolicy;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub branding: BrandingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the GovChat backend (local development server by default)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// File holding the bearer token (None = token file in the data directory)
    pub token_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// What to show when no model carries the context's capability key
    #[serde(default)]
    pub empty_match_policy: EmptyMatchPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    /// Product name substituted into help content
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
        }
    }
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_app_name() -> String {
    "GovChat-NL".to_string()
}
