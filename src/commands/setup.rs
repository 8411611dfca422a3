use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::error::{Result, WizardError};
use crate::models::{find_template, CustomDeviceRequest, Location, Person, Rule};

// ─── Types ───

/// Declarative description of an environment, applied in one go.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupFile {
    pub locations: Vec<Location>,
    pub people: Vec<Person>,
    pub devices: Vec<DeviceInstall>,
    pub custom_devices: Vec<CustomInstall>,
    /// Added to the default rules.
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceInstall {
    pub template: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomInstall {
    #[serde(flatten)]
    pub device: CustomDeviceRequest,
    pub location: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetupSummary {
    pub locations: usize,
    pub people: usize,
    pub devices: usize,
    pub rules: usize,
}

// ─── Commands ───

/// All or nothing: the first rejected entry leaves the state unchanged.
pub fn apply_setup(app: &App, setup: SetupFile) -> Result<SetupSummary> {
    let catalog = app.catalog();
    let summary = SetupSummary {
        locations: setup.locations.len(),
        people: setup.people.len(),
        devices: setup.devices.len() + setup.custom_devices.len(),
        rules: setup.rules.len(),
    };

    app.store().update(|current| {
        let mut next = current.clone();
        for location in setup.locations {
            next = next.with_location(location)?;
        }
        for person in setup.people {
            next = next.with_person(person)?;
        }
        for install in &setup.devices {
            let template = find_template(catalog, &install.template).ok_or_else(|| {
                WizardError::NotFound(format!("device template '{}'", install.template))
            })?;
            next = next.with_device_installed(template, &install.location)?;
        }
        for custom in setup.custom_devices {
            next = next.with_device_installed(&custom.device.into_device(), &custom.location)?;
        }
        for rule in setup.rules {
            next = next.with_rule(rule)?;
        }
        Ok(next)
    })?;

    log::info!(
        "[Setup] Applied {} location(s), {} person(s), {} device(s), {} rule(s)",
        summary.locations,
        summary.people,
        summary.devices,
        summary.rules
    );
    Ok(summary)
}

pub fn load_setup(app: &App, path: &Path) -> Result<SetupSummary> {
    let content = std::fs::read_to_string(path)?;
    let setup: SetupFile = serde_json::from_str(&content)?;
    apply_setup(app, setup)
}
