use crate::app::App;
use crate::error::{Result, WizardError};
use crate::models::{find_template, CustomDeviceRequest, Device, DeviceCategory};
use crate::services::system_state;

pub fn get_device_catalog(app: &App) -> Vec<DeviceCategory> {
    app.catalog().to_vec()
}

pub fn get_installed_devices(app: &App) -> Vec<Device> {
    app.snapshot().devices.clone()
}

/// Installs a copy of the catalog template named `template` at `location`.
pub fn install_device(app: &App, template: &str, location: &str) -> Result<Device> {
    let template = find_template(app.catalog(), template)
        .ok_or_else(|| WizardError::NotFound(format!("device template '{}'", template)))?;
    app.store()
        .update(|s| s.with_device_installed(template, location))?;
    Ok(template.installed_at(location))
}

pub fn add_custom_device(app: &App, request: CustomDeviceRequest, location: &str) -> Result<Device> {
    let device = request.into_device();
    app.store()
        .update(|s| s.with_device_installed(&device, location))?;
    log::info!("[Devices] Added custom device '{}' at {}", device.name, location);
    Ok(device.installed_at(location))
}

pub fn remove_device(app: &App, name: &str, location: Option<&str>) -> Result<Vec<Device>> {
    let state = app.store().update(|s| s.without_device(name, location))?;
    Ok(state.devices.clone())
}

/// Fills current values for installed devices from the model.
pub async fn generate_system_state(app: &App) -> Result<usize> {
    let client = app.client();
    system_state::generate_system_state(client.as_ref(), app.store()).await
}
