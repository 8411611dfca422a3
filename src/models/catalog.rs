use super::{Capability, DataType, Device, DeviceCategory, DeviceInterface, DeviceKind};

fn template(
    name: &str,
    description: &str,
    kind: DeviceKind,
    data_type: DataType,
    unit: Option<&str>,
    interface: (Capability, Capability, Capability),
    features: &[&str],
) -> Device {
    let (display, app, voice) = interface;
    Device {
        name: name.to_string(),
        description: description.to_string(),
        kind,
        data_type,
        unit: unit.map(str::to_string),
        interface: DeviceInterface { display, app, voice },
        features: features.iter().map(|f| f.to_string()).collect(),
        location: None,
        current_value: None,
        category: None,
        is_custom: false,
    }
}

/// Read-only device templates offered for installation.
pub fn get_device_catalog() -> Vec<DeviceCategory> {
    vec![
        DeviceCategory {
            category: "Environmental Sensors".to_string(),
            devices: vec![
                template(
                    "Temperature Sensor",
                    "Measures ambient temperature",
                    DeviceKind::Sensor,
                    DataType::Number,
                    Some("degrees Celsius"),
                    ("Numeric".into(), "Graph".into(), false.into()),
                    &["Alarms for high/low thresholds"],
                ),
                template(
                    "Humidity Sensor",
                    "Measures relative humidity",
                    DeviceKind::Sensor,
                    DataType::Number,
                    Some("percentage"),
                    ("Numeric".into(), "Graph".into(), false.into()),
                    &["Alarms for high/low thresholds"],
                ),
                template(
                    "Air Quality Sensor",
                    "Measures various pollutants (e.g., CO2, VOCs, PM2.5)",
                    DeviceKind::Sensor,
                    DataType::Number,
                    Some("ppm or µg/m³"),
                    ("Numeric".into(), true.into(), false.into()),
                    &["Alarms", "Recommendations for improving air quality"],
                ),
            ],
        },
        DeviceCategory {
            category: "Actuators and Controllers".to_string(),
            devices: vec![
                template(
                    "Smart Plug",
                    "Controls power to connected devices",
                    DeviceKind::Actuator,
                    DataType::Boolean,
                    None,
                    ("Physical button".into(), true.into(), true.into()),
                    &["Energy monitoring", "Scheduling", "Scenes"],
                ),
                template(
                    "Smart Light Bulb",
                    "Controls light color and brightness",
                    DeviceKind::Actuator,
                    DataType::String,
                    None,
                    (false.into(), "Color picker and brightness slider".into(), true.into()),
                    &["Schedules", "Scenes", "Music sync", "Wake-up light"],
                ),
                template(
                    "Smart Thermostat",
                    "Controls HVAC settings",
                    DeviceKind::Actuator,
                    DataType::Number,
                    Some("temperature"),
                    ("LCD".into(), true.into(), true.into()),
                    &["Schedules", "Geofencing", "Energy reports", "HVAC maintenance alerts"],
                ),
            ],
        },
    ]
}

pub fn find_template<'a>(catalog: &'a [DeviceCategory], name: &str) -> Option<&'a Device> {
    catalog
        .iter()
        .flat_map(|c| c.devices.iter())
        .find(|d| d.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_templates_are_unlocated() {
        let catalog = get_device_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog
            .iter()
            .flat_map(|c| c.devices.iter())
            .all(|d| d.location.is_none() && d.current_value.is_none()));
    }

    #[test]
    fn find_template_ignores_case() {
        let catalog = get_device_catalog();
        let plug = find_template(&catalog, "smart plug").unwrap();
        assert_eq!(plug.data_type, DataType::Boolean);
        assert!(find_template(&catalog, "Toaster").is_none());
    }
}
