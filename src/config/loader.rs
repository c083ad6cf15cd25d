use crate::config::settings::LauncherConfig;
use crate::error::{LauncherError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("nl", "govchat", "govchat-launcher")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| LauncherError::Config("Could not determine config directory".to_string()))
}

/// Get XDG-compliant data directory
pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("nl", "govchat", "govchat-launcher")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| LauncherError::Config("Could not determine data directory".to_string()))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default location of the bearer token file
pub fn default_token_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("token"))
}

/// Token file to read, honouring the configured override
pub fn token_path(config: &LauncherConfig) -> Result<PathBuf> {
    match &config.api.token_path {
        Some(path) => Ok(path.clone()),
        None => default_token_path(),
    }
}

/// Load config from file, creating default if not exists
pub fn load_config() -> Result<LauncherConfig> {
    let path = config_path()?;

    if !path.exists() {
        let config = LauncherConfig::default();
        save_config_to(&config, &path)?;
        return Ok(config);
    }

    load_config_from(&path)
}

/// Load config from an explicit path; the file must exist
pub fn load_config_from(path: &Path) -> Result<LauncherConfig> {
    if !path.exists() {
        return Err(LauncherError::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config: LauncherConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Save config to an explicit path
pub fn save_config_to(config: &LauncherConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Ensure all data directories exist
pub fn ensure_directories() -> Result<()> {
    fs::create_dir_all(config_dir()?)?;
    fs::create_dir_all(data_dir()?)?;
    Ok(())
}

/// Apply `GOVCHAT_*` environment overrides on top of a loaded config
pub fn apply_env(mut config: LauncherConfig) -> Result<LauncherConfig> {
    if let Ok(url) = std::env::var("GOVCHAT_API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Ok(path) = std::env::var("GOVCHAT_TOKEN_PATH") {
        config.api.token_path = Some(PathBuf::from(path));
    }
    if let Ok(name) = std::env::var("GOVCHAT_APP_NAME") {
        config.branding.app_name = name;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &LauncherConfig) -> Result<()> {
    let url = config.api.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(LauncherError::InvalidConfig(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            config.api.base_url
        )));
    }
    if config.branding.app_name.trim().is_empty() {
        return Err(LauncherError::InvalidConfig(
            "branding.app_name must not be empty".to_string(),
        ));
    }
    Ok(())
}
