use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Settings;

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_DATA_DIR: &str = "IOT_WIZARD_DATA_DIR";
const APP_DIR_NAME: &str = "iot-wizard";

pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

pub fn api_key_from_env() -> Option<String> {
    std::env::var(ENV_API_KEY).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn resolve_api_key(explicit_key: &str) -> String {
    let trimmed = explicit_key.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    api_key_from_env().unwrap_or_default()
}

pub fn apply_env_defaults(settings: &mut Settings) {
    if settings.ai.api_key.trim().is_empty() {
        settings.ai.api_key = api_key_from_env().unwrap_or_default();
    }
}

/// `$IOT_WIZARD_DATA_DIR`, else the platform data dir, else `./.iot-wizard`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config").join("settings.json")
}

/// Missing file means defaults. Env defaults are not applied here.
pub fn read_settings(data_dir: &Path) -> Result<Settings> {
    let config_path = settings_path(data_dir);
    if !config_path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_settings(data_dir: &Path, settings: &Settings) -> Result<()> {
    let config_path = settings_path(data_dir);
    if let Some(config_dir) = config_path.parent() {
        std::fs::create_dir_all(config_dir)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&config_path, content)?;
    log::debug!("[Config] Saved settings to {}", config_path.display());
    Ok(())
}
