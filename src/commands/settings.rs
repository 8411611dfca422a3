use crate::app::App;
use crate::error::Result;
use crate::models::Settings;
use crate::utils::config;

pub fn get_settings(app: &App) -> Settings {
    let mut settings = app.settings();
    config::apply_env_defaults(&mut settings);
    settings
}

/// Persists and applies new settings. Interval and history limit take effect
/// on the next launch.
pub fn update_settings(app: &App, settings: Settings) -> Result<()> {
    config::write_settings(app.data_dir(), &settings)?;
    app.replace_settings(settings);
    log::info!("[Settings] Updated");
    Ok(())
}

/// Stores the key for later requests. A running simulation keeps the client
/// it was started with.
pub fn set_api_key(app: &App, api_key: &str) -> Result<()> {
    let mut settings = app.settings();
    settings.ai.api_key = api_key.trim().to_string();
    update_settings(app, settings)
}
